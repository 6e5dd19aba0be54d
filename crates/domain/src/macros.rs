//! Macro for implementing string conversions on domain enums
//!
//! Every persisted enum (sync mode, execution status, log level, ...) is
//! stored as a stable lowercase token. This macro generates `as_str`,
//! `Display`, case-insensitive `FromStr` and an `ALL` constant listing the
//! variants in declaration order.
//!
//! # Example
//!
//! ```rust
//! use arkive_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Direction {
//!     Push,
//!     Pull,
//! }
//!
//! impl_domain_enum_conversions!(Direction {
//!     Push => "push",
//!     Pull => "pull",
//! });
//!
//! assert_eq!(Direction::Pull.as_str(), "pull");
//! assert_eq!("PUSH".parse::<Direction>(), Ok(Direction::Push));
//! assert_eq!(Direction::ALL.len(), 2);
//! ```

/// Implements `as_str`, `ALL`, `Display` and `FromStr` for a fieldless enum.
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase
///   storage token
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl $enum_name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$enum_name] = &[$($enum_name::$variant),+];

            /// Stable storage token for this variant.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
