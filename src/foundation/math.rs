pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div255_endpoints() {
        assert_eq!(mul_div255_u16(255, 255), 255);
        assert_eq!(mul_div255_u16(255, 0), 0);
        assert_eq!(mul_div255_u16(0, 255), 0);
    }

    #[test]
    fn mul_div255_rounds_to_nearest() {
        // 128 * 128 / 255 = 64.25 -> 64
        assert_eq!(mul_div255_u16(128, 128), 64);
        // 255 * 128 / 255 = 128 exactly
        assert_eq!(mul_div255_u16(255, 128), 128);
    }
}
