//! Core combinational logic for gate nodes

/// True when every input is high
pub fn and(inputs: &[bool]) -> bool {
    inputs.iter().all(|&v| v)
}

/// True when any input is high
pub fn or(inputs: &[bool]) -> bool {
    inputs.iter().any(|&v| v)
}

pub fn not(input: bool) -> bool {
    !input
}

pub fn nand(inputs: &[bool]) -> bool {
    !and(inputs)
}

pub fn nor(inputs: &[bool]) -> bool {
    !or(inputs)
}

/// Odd parity; for two inputs this is the usual exclusive or
pub fn xor(inputs: &[bool]) -> bool {
    inputs.iter().filter(|&&v| v).count() % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(false, false, false, false, true, true, false)]
    #[case(false, true, false, true, true, false, true)]
    #[case(true, false, false, true, true, false, true)]
    #[case(true, true, true, true, false, false, false)]
    fn test_two_input_gates(
        #[case] a: bool,
        #[case] b: bool,
        #[case] and_out: bool,
        #[case] or_out: bool,
        #[case] nand_out: bool,
        #[case] nor_out: bool,
        #[case] xor_out: bool,
    ) {
        assert_eq!(and(&[a, b]), and_out);
        assert_eq!(or(&[a, b]), or_out);
        assert_eq!(nand(&[a, b]), nand_out);
        assert_eq!(nor(&[a, b]), nor_out);
        assert_eq!(xor(&[a, b]), xor_out);
    }

    #[rstest]
    fn test_three_input_gates(
        #[values(false, true)] a: bool,
        #[values(false, true)] b: bool,
        #[values(false, true)] c: bool,
    ) {
        assert_eq!(and(&[a, b, c]), a && b && c);
        assert_eq!(or(&[a, b, c]), a || b || c);
    }

    #[test]
    fn test_not() {
        assert!(not(false));
        assert!(!not(true));
    }
}
