use crate::{macros::vocabulary, set::Set};

vocabulary! {
    /// Legacy prefix accepted by an instruction.
    pub enum Prefix(Prefix) {
        Rep = "REP",
        /// Conditional REP (REPZ/REPNZ).
        RepC = "REPC",
        /// XACQUIRE/XRELEASE, only with LOCK.
        Hle = "HLE",
        Bnd = "BND",
        Lock = "LOCK",
        /// Branch hints.
        Bh = "BH",
        XAcquire = "XACQUIRE",
        XRelease = "XRELEASE",
        /// XACQUIRE/XRELEASE without LOCK.
        HleWithoutLock = "HLEWOL",
        /// Do not track.
        Dnt = "DNT",
    }
}

pub type Prefixes = Set<Prefix>;
