// !!!! CAUTION !!!!
// !---------------!
// !  DANGER ZONE  !
// !---------------!
// ! HIGH RISK  OF !
// ! BRAIN DAMAGE  !
// !---------------!
// !   KEEP OUT    !
// !!!!!!!!!!!!!!!!!

/// Defines a closed vocabulary: an enum whose variants map one-to-one to the
/// tokens accepted in the specification files.
///
/// Parsing goes through `FromStr`, an unknown token is reported as
/// [`SpecError::Unknown`](crate::error::SpecError::Unknown) naming the vocabulary
/// given in parentheses.
#[macro_export]
macro_rules! vocabulary {
    ($(#[$attr:meta])* $vis:vis enum $name:ident($kind:ident) {
        $($(#[$vattr:meta])* $variant:ident = $token:literal),+ $(,)?
    }) => (
        $(#[$attr])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis enum $name {
            $($(#[$vattr])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];
            pub const TOKENS: &'static [&'static str] = &[$($token),+];
            pub const COUNT: usize = Self::ALL.len();

            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $token,)+
                }
            }

            pub fn from_token(token: &str) -> Option<Self> {
                Some(match token {
                    $($token => Self::$variant,)+
                    _ => return None,
                })
            }

            pub const fn index(&self) -> usize {
                *self as usize
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::error::SpecError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::from_token(s).ok_or_else(|| $crate::error::SpecError::Unknown {
                    vocabulary: $crate::error::Vocabulary::$kind,
                    token: s.to_owned(),
                    expected: Self::TOKENS,
                })
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, fmt: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
                fmt.write_str(self.as_str())
            }
        }
    );
}
pub use crate::vocabulary;

/// Parses a `|`-separated list of vocabulary tokens.
///
/// Every token is validated before anything is returned, so a bad token never
/// leaves a container half-updated.
pub fn parse_list<T>(value: &str) -> Result<Vec<T>, crate::error::SpecError>
where
    T: core::str::FromStr<Err = crate::error::SpecError>,
{
    value.split('|').map(|i| i.trim().parse()).collect()
}
