use crate::macros::vocabulary;

vocabulary! {
    /// EVEX tuple type, selects the compressed displacement scale.
    pub enum Tuple(Tuple) {
        FullVector = "fv",
        HalfVector = "hv",
        QuarterVector = "qv",
        FullVectorMem = "fvm",
        HalfVectorMem = "hvm",
        QuarterVectorMem = "qvm",
        OctVectorMem = "ovm",
        Dup = "dup",
        Mem128 = "m128",
        Tuple1Scalar8 = "t1s8",
        Tuple1Scalar16 = "t1s16",
        Tuple1Scalar = "t1s",
        Tuple1Fixed = "t1f",
        Tuple2 = "t2",
        Tuple4 = "t4",
        Tuple8 = "t8",
        Tuple1x4 = "t1_4x",
    }
}

vocabulary! {
    /// EVEX extension an instruction belongs to.
    pub enum EvexMode(EvexMode) {
        /// Native AVX-512 instruction.
        Native = "none",
        /// Promoted VEX instruction.
        Vex = "vex",
        /// Promoted legacy instruction.
        Legacy = "legacy",
        /// Conditional compare instruction.
        Cond = "cond",
    }
}
