/// HSV (all components in `[0, 1]`) to linear RGBA with the given alpha.
pub fn hsv_to_rgba(h: f32, s: f32, v: f32, alpha: f32) -> [f32; 4] {
    let c = v * s;
    let sector = (h.rem_euclid(1.0)) * 6.0;
    let x = c * (1.0 - ((sector % 2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match sector as i32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [r + m, g + m, b + m, alpha]
}
