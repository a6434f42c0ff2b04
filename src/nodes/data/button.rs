//! Manual toggle source

/// Flip the pressed state; the node emits it on its next evaluation
pub fn toggle(pressed: &mut bool) {
    *pressed = !*pressed;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_restores() {
        let mut pressed = false;
        toggle(&mut pressed);
        assert!(pressed);
        toggle(&mut pressed);
        assert!(!pressed);
    }
}
