/// A simplified and const generic version of arrayref
#[inline]
pub(crate) fn take<const N: usize>(data: &[u8]) -> [u8; N] {
    debug_assert!(data.len() >= N);
    let mut out = [0u8; N];
    out.copy_from_slice(&data[..N]);
    out
}

#[inline]
pub(crate) fn le_u32(data: &[u8]) -> u32 {
    u32::from_le_bytes(take::<4>(data))
}

/// Fixed width string fields are terminated by the first nul byte, if any
#[inline]
pub(crate) fn until_nul(data: &[u8]) -> &[u8] {
    match data.iter().position(|&x| x == 0) {
        Some(end) => &data[..end],
        None => data,
    }
}

/// Case insensitive check on the tail of an entry name
#[inline]
pub(crate) fn ends_with_ignore_ascii_case(name: &str, suffix: &str) -> bool {
    let (name, suffix) = (name.as_bytes(), suffix.as_bytes());
    name.len() >= suffix.len() && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(b"a.tga\0\0\0", b"a.tga")]
    #[case(b"a.tga\0junk", b"a.tga")]
    #[case(b"abcdefgh", b"abcdefgh")]
    #[case(b"\0abc", b"")]
    fn test_until_nul(#[case] input: &[u8], #[case] expected: &[u8]) {
        assert_eq!(until_nul(input), expected);
    }

    #[rstest]
    #[case("bg01.tga", ".tga", true)]
    #[case("BG01.TGA", ".tga", true)]
    #[case("bg01.tga.bak", ".tga", false)]
    #[case("tga", ".tga", false)]
    fn test_ends_with_ignore_ascii_case(
        #[case] name: &str,
        #[case] suffix: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(ends_with_ignore_ascii_case(name, suffix), expected);
    }

    #[test]
    fn test_le_u32() {
        assert_eq!(le_u32(&[0x4c, 0x00, 0x00, 0x00, 0xff]), 0x4c);
    }
}
