//! Raster rotation about the image center with canvas expansion.
//!
//! Positive angles rotate clockwise on screen, matching the viewport
//! convention. Quarter turns are lossless pixel shuffles; every other angle
//! uses inverse mapping with the configured filter.
//!
//! # Algorithm
//!
//! For each output pixel center `d` (relative to the output center), the
//! source position is the inverse of the clockwise rotation:
//!
//! ```text
//! src_x =  dx * cos(θ) + dy * sin(θ) + src_cx
//! src_y = -dx * sin(θ) + dy * cos(θ) + src_cy
//! ```
//!
//! Output pixels whose source falls outside the raster are black.

use super::{DecodedImage, FilterType, RasterError};

/// Angles closer than this to a quarter turn take the lossless path.
const QUARTER_TURN_EPSILON: f64 = 1e-3;

/// Compute the dimensions of the bounding box for a rotated image.
///
/// # Arguments
///
/// * `width` - Original image width
/// * `height` - Original image height
/// * `angle_degrees` - Rotation angle in degrees (positive = clockwise)
///
/// # Returns
///
/// Tuple of (new_width, new_height), each at least 1.
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    match quarter_turns(angle_degrees) {
        Some(0) | Some(2) => return (width, height),
        Some(_) => return (height, width),
        None => {}
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();

    let w = width as f64;
    let h = height as f64;

    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Rotate an image about its center.
///
/// The output canvas is expanded to fit the whole rotated image.
///
/// # Arguments
///
/// * `image` - Source image to rotate
/// * `angle_degrees` - Rotation angle in degrees (positive = clockwise)
/// * `filter` - Interpolation filter for non-quarter angles
///
/// # Errors
///
/// Returns an error if the source buffer does not match its dimensions.
pub fn rotate(
    image: &DecodedImage,
    angle_degrees: f64,
    filter: FilterType,
) -> Result<DecodedImage, RasterError> {
    image.validate()?;

    if let Some(turns) = quarter_turns(angle_degrees) {
        if turns == 0 {
            return Ok(image.clone());
        }
        let rgb = image.to_rgb_image().ok_or(RasterError::InvalidPixelData {
            expected: (image.width as usize) * (image.height as usize) * 3,
            actual: image.pixels.len(),
        })?;
        let turned = match turns {
            1 => image::imageops::rotate90(&rgb),
            2 => image::imageops::rotate180(&rgb),
            _ => image::imageops::rotate270(&rgb),
        };
        return Ok(DecodedImage::from_rgb_image(turned));
    }

    let (dst_w, dst_h) = compute_rotated_bounds(image.width, image.height, angle_degrees);
    let angle_rad = angle_degrees.to_radians();
    let (sin, cos) = angle_rad.sin_cos();

    let src_cx = image.width as f64 / 2.0;
    let src_cy = image.height as f64 / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    let mut output = vec![0u8; (dst_w as usize) * (dst_h as usize) * 3];

    for y in 0..dst_h {
        let dy = y as f64 + 0.5 - dst_cy;
        for x in 0..dst_w {
            let dx = x as f64 + 0.5 - dst_cx;

            // Continuous source position, shifted into pixel-index space
            let u = dx * cos + dy * sin + src_cx - 0.5;
            let v = -dx * sin + dy * cos + src_cy - 0.5;

            if let Some(rgb) = sample(image, u, v, filter) {
                let idx = ((y as usize) * (dst_w as usize) + x as usize) * 3;
                output[idx..idx + 3].copy_from_slice(&rgb);
            }
        }
    }

    Ok(DecodedImage {
        width: dst_w,
        height: dst_h,
        pixels: output,
    })
}

/// Number of clockwise quarter turns if the angle is one, else `None`.
fn quarter_turns(angle_degrees: f64) -> Option<u8> {
    let normalized = angle_degrees.rem_euclid(360.0);
    let turns = (normalized / 90.0).round();
    if (normalized - turns * 90.0).abs() < QUARTER_TURN_EPSILON {
        Some((turns as u8) % 4)
    } else {
        None
    }
}

fn sample(image: &DecodedImage, u: f64, v: f64, filter: FilterType) -> Option<[u8; 3]> {
    let max_x = image.width as f64 - 0.5;
    let max_y = image.height as f64 - 0.5;
    if u < -0.5 || v < -0.5 || u > max_x || v > max_y {
        return None;
    }

    Some(match filter {
        FilterType::Nearest => {
            let x = clamp_index(u.round() as i64, image.width);
            let y = clamp_index(v.round() as i64, image.height);
            image.pixel(x, y)
        }
        FilterType::Bilinear => sample_bilinear(image, u, v),
        FilterType::Lanczos3 => sample_lanczos3(image, u, v),
    })
}

#[inline]
fn clamp_index(i: i64, len: u32) -> u32 {
    i.clamp(0, len as i64 - 1) as u32
}

fn sample_bilinear(image: &DecodedImage, u: f64, v: f64) -> [u8; 3] {
    let x0 = u.floor();
    let y0 = v.floor();
    let fx = u - x0;
    let fy = v - y0;

    let x0i = clamp_index(x0 as i64, image.width);
    let x1i = clamp_index(x0 as i64 + 1, image.width);
    let y0i = clamp_index(y0 as i64, image.height);
    let y1i = clamp_index(y0 as i64 + 1, image.height);

    let p00 = image.pixel(x0i, y0i);
    let p10 = image.pixel(x1i, y0i);
    let p01 = image.pixel(x0i, y1i);
    let p11 = image.pixel(x1i, y1i);

    let mut out = [0u8; 3];
    for c in 0..3 {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

fn sample_lanczos3(image: &DecodedImage, u: f64, v: f64) -> [u8; 3] {
    let x_base = u.floor() as i64;
    let y_base = v.floor() as i64;

    let mut sum = [0.0f64; 3];
    let mut weight_sum = 0.0;

    for j in (y_base - 2)..=(y_base + 3) {
        let wy = lanczos_weight(v - j as f64);
        if wy == 0.0 {
            continue;
        }
        let sy = clamp_index(j, image.height);
        for i in (x_base - 2)..=(x_base + 3) {
            let w = lanczos_weight(u - i as f64) * wy;
            if w == 0.0 {
                continue;
            }
            let p = image.pixel(clamp_index(i, image.width), sy);
            for c in 0..3 {
                sum[c] += p[c] as f64 * w;
            }
            weight_sum += w;
        }
    }

    if weight_sum.abs() < f64::EPSILON {
        return sample_bilinear(image, u, v);
    }

    let mut out = [0u8; 3];
    for c in 0..3 {
        out[c] = (sum[c] / weight_sum).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Lanczos kernel with a = 3.
fn lanczos_weight(x: f64) -> f64 {
    const A: f64 = 3.0;
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= A {
        return 0.0;
    }
    let pi_x = std::f64::consts::PI * x;
    A * pi_x.sin() * (pi_x / A).sin() / (pi_x * pi_x)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_output_matches_computed_bounds(
            w in 1u32..40,
            h in 1u32..40,
            angle in -360.0f64..360.0,
        ) {
            let img = DecodedImage::new(w, h, vec![77; (w * h * 3) as usize]);
            let out = rotate(&img, angle, FilterType::Bilinear).unwrap();
            prop_assert_eq!((out.width, out.height), compute_rotated_bounds(w, h, angle));
            prop_assert_eq!(out.pixels.len(), (out.width * out.height * 3) as usize);
        }

        #[test]
        fn prop_bounds_symmetric_in_sign(w in 1u32..500, h in 1u32..500, angle in 0.0f64..180.0) {
            prop_assert_eq!(
                compute_rotated_bounds(w, h, angle),
                compute_rotated_bounds(w, h, -angle)
            );
        }
    }
}
