use core::fmt;

use crate::macros::vocabulary;

vocabulary! {
    /// Exception type, the class of faults an instruction may raise.
    pub enum ExceptionType(ExceptionType) {
        T1 = "1",
        T2 = "2",
        T3 = "3",
        T4 = "4",
        T5 = "5",
        T6 = "6",
        T7 = "7",
        T8 = "8",
        T9 = "9",
        T10 = "10",
        T11 = "11",
        T12 = "12",
        T13 = "13",
        T14 = "14",
        E1 = "E1",
        E1NF = "E1NF",
        E2 = "E2",
        E3 = "E3",
        E3NF = "E3NF",
        E4 = "E4",
        E4nb = "E4nb",
        E4NF = "E4NF",
        E4NFnb = "E4NFnb",
        E4S = "E4S",
        E5 = "E5",
        E5NF = "E5NF",
        E6 = "E6",
        E6NF = "E6NF",
        E7NM = "E7NM",
        E9 = "E9",
        E9NF = "E9NF",
        E10 = "E10",
        E10NF = "E10NF",
        E10S = "E10S",
        E11 = "E11",
        E12 = "E12",
        E12NP = "E12NP",
        K20 = "K20",
        K21 = "K21",
        AmxE1 = "AMX_E1",
        AmxE2 = "AMX_E2",
        AmxE3 = "AMX_E3",
        AmxE4 = "AMX_E4",
        AmxE5 = "AMX_E5",
        AmxE6 = "AMX_E6",
        AmxE7 = "AMX_E7",
        AmxE8 = "AMX_E8",
        AmxE9 = "AMX_E9",
        AmxE10 = "AMX_E10",
        AmxE11 = "AMX_E11",
        AmxEvexE1 = "AMX_EVEX_E1",
        AmxEvexE2 = "AMX_EVEX_E2",
        AmxEvexE3 = "AMX_EVEX_E3",
        AmxEvexE4 = "AMX_EVEX_E4",
        AmxEvexE5 = "AMX_EVEX_E5",
        AmxEvexE6 = "AMX_EVEX_E6",
        AmxEvexE7 = "AMX_EVEX_E7",
        AmxEvexE8 = "AMX_EVEX_E8",
        AmxEvexE9 = "AMX_EVEX_E9",
        AmxEvexE10 = "AMX_EVEX_E10",
        AmxEvexE11 = "AMX_EVEX_E11",
        ApxBmi = "APX_EVEX_BMI",
        ApxCcmp = "APX_EVEX_CCMP",
        ApxCfcmov = "APX_EVEX_CFCMOV",
        ApxCmpccxadd = "APX_EVEX_CMPCCXADD",
        ApxEnqcmd = "APX_EVEX_ENQCMD",
        ApxInt = "APX_EVEX_INT",
        ApxInvept = "APX_EVEX_INVEPT",
        ApxInvpcid = "APX_EVEX_INVPCID",
        ApxInvvpid = "APX_EVEX_INVVPID",
        ApxKeylocker = "APX_EVEX_KEYLOCKER",
        ApxKmov = "APX_EVEX_KMOV",
        ApxMovrs = "APX_EVEX_MOVRS",
        ApxPp2 = "APX_EVEX_PP2",
        ApxRaoint = "APX_EVEX_RAOINT",
        ApxSha = "APX_EVEX_SHA",
        ApxUserMsr = "APX_EVEX_USER_MSR",
        ApxWrss = "APX_EVEX_WRSS",
        ApxWruss = "APX_EVEX_WRUSS",
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExceptionClass {
    /// Legacy SSE and VEX encoded instructions.
    SseAvx,
    Evex,
    /// Opmask instructions.
    Opmask,
    Amx,
    /// APX promoted legacy instructions.
    Apx,
}

impl ExceptionType {
    pub fn class(&self) -> ExceptionClass {
        let s = self.as_str();
        if s.starts_with("AMX_") {
            ExceptionClass::Amx
        } else if s.starts_with("APX_") {
            ExceptionClass::Apx
        } else if s.starts_with('K') {
            ExceptionClass::Opmask
        } else if s.starts_with('E') {
            ExceptionClass::Evex
        } else {
            ExceptionClass::SseAvx
        }
    }
}

impl fmt::Display for ExceptionClass {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::SseAvx => "SSE/AVX",
            Self::Evex => "EVEX",
            Self::Opmask => "OPMASK",
            Self::Amx => "AMX",
            Self::Apx => "APX",
        };
        fmt.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class() {
        let class = |s: &str| s.parse::<ExceptionType>().map(|i| i.class());
        assert_eq!(class("4"), Ok(ExceptionClass::SseAvx));
        assert_eq!(class("E4NFnb"), Ok(ExceptionClass::Evex));
        assert_eq!(class("K21"), Ok(ExceptionClass::Opmask));
        assert_eq!(class("AMX_EVEX_E3"), Ok(ExceptionClass::Amx));
        assert_eq!(class("APX_EVEX_PP2"), Ok(ExceptionClass::Apx));
        assert!(class("E8").is_err());
    }
}
