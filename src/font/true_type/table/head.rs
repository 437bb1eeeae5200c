/// The parts of the font header outline extraction needs
#[derive(Debug, Clone, Copy)]
pub struct Head {
    /// Usually 1000 or 2048
    pub units_per_em: u16,

    /// 0 for short `loca` offsets, 1 for long
    pub index_to_loc_format: i16,
}

impl Head {
    pub const MAGIC_NUMBER: u32 = 0x5F0F_3CF5;
}
