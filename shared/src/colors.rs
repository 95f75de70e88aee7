/// d3 `schemeCategory10`, in order.
pub const CATEGORY10: [(u8, u8, u8); 10] = [
    (0x1f, 0x77, 0xb4),
    (0xff, 0x7f, 0x0e),
    (0x2c, 0xa0, 0x2c),
    (0xd6, 0x27, 0x28),
    (0x94, 0x67, 0xbd),
    (0x8c, 0x56, 0x4b),
    (0xe3, 0x77, 0xc2),
    (0x7f, 0x7f, 0x7f),
    (0xbc, 0xbd, 0x22),
    (0x17, 0xbe, 0xcf),
];

/// Channel multiplier applied by one `darker` step.
const DARKER: f64 = 0.7;

/// Ordinal palette color for the region at `index` in dataset order.
/// Wraps around after ten entries.
pub fn category10(index: usize) -> (u8, u8, u8) {
    CATEGORY10[index % CATEGORY10.len()]
}

/// Darken a color by `k` steps, each step scaling every channel by 0.7.
/// `k = 0` is the identity; negative `k` brightens.
pub fn darker(color: (u8, u8, u8), k: f64) -> (u8, u8, u8) {
    let factor = DARKER.powf(k);
    (
        scale_channel(color.0, factor),
        scale_channel(color.1, factor),
        scale_channel(color.2, factor),
    )
}

/// Darken by a percentage of one `darker` step (100 = one full step).
pub fn darken_percent(color: (u8, u8, u8), percent: f64) -> (u8, u8, u8) {
    darker(color, percent / 100.0)
}

fn scale_channel(value: u8, factor: f64) -> u8 {
    (value as f64 * factor).round().clamp(0.0, 255.0) as u8
}
