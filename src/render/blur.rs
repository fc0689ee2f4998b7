use crate::foundation::error::{ExportError, ExportResult};

/// Separable gaussian blur over premultiplied RGBA8 pixels.
///
/// Weights are fixed-point Q16 so the two passes stay integer-only. A radius of 0 is the
/// identity.
pub(crate) fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
) -> ExportResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| ExportError::invalid_configuration("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(ExportError::invalid_configuration(
            "blur expects src matching width*height*4",
        ));
    }
    if radius == 0 {
        return Ok(src.to_vec());
    }

    // sigma tied to radius so callers only choose one knob
    let kernel = gaussian_kernel_q16(radius, radius as f64 / 2.0)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    convolve(src, &mut tmp, width, height, &kernel, Pass::Horizontal);
    convolve(&tmp, &mut out, width, height, &kernel, Pass::Vertical);
    Ok(out)
}

#[derive(Clone, Copy)]
enum Pass {
    Horizontal,
    Vertical,
}

fn gaussian_kernel_q16(radius: u32, sigma: f64) -> ExportResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ExportError::invalid_configuration("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r).map(|i| (-(i * i) as f64 / denom).exp()).collect();
    let sum: f64 = weights_f.iter().sum();

    let mut weights = Vec::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as i64;
        weights.push(q as u32);
        acc += q;
    }

    // Distribute the rounding residue onto the center tap so the kernel sums to exactly 1.0.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

fn convolve(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], pass: Pass) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i32 - radius;
                let (sx, sy) = match pass {
                    Pass::Horizontal => ((x + d).clamp(0, w - 1), y),
                    Pass::Vertical => (x, (y + d).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                out_idx_write(dst, out_idx + c, acc[c]);
            }
        }
    }
}

fn out_idx_write(dst: &mut [u8], idx: usize, acc: u64) {
    let v = (acc + 32768) >> 16;
    dst[idx] = v.min(255) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_zero_is_identity() {
        let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(blur_rgba8_premul(&src, 1, 2, 0).unwrap(), src);
    }

    #[test]
    fn constant_image_is_unchanged() {
        let (w, h) = (4u32, 3u32);
        let src = [10u8, 20, 30, 40].repeat((w * h) as usize);
        assert_eq!(blur_rgba8_premul(&src, w, h, 3).unwrap(), src);
    }

    #[test]
    fn energy_spreads_but_is_conserved() {
        let (w, h) = (5u32, 5u32);
        let mut src = vec![0u8; (w * h * 4) as usize];
        let center = ((2 * w + 2) * 4) as usize;
        src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);

        let out = blur_rgba8_premul(&src, w, h, 2).unwrap();

        let nonzero = out.chunks_exact(4).filter(|px| px[3] != 0).count();
        assert!(nonzero > 1);

        let sum_a: u32 = out.chunks_exact(4).map(|px| u32::from(px[3])).sum();
        assert!((sum_a as i32 - 255).abs() <= 4);
    }

    #[test]
    fn bad_buffer_length_is_rejected() {
        let src = vec![0u8; 7];
        assert!(blur_rgba8_premul(&src, 2, 2, 1).is_err());
    }
}
