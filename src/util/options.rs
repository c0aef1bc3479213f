//! Run-time options.
//!
//! Every option has a type, a validator and a default. Defaults can be overridden from the
//! environment: a variable named `OOPMAP_` followed by the upper-case option name (such as
//! `OOPMAP_STACK_SLOT_SIZE=4`) is applied when [`Options::default`] runs. Options can also be
//! set by name with [`Options::set_from_str`] or [`Options::set_bulk_by_str`].

use std::default::Default;

/// Prefix of environment variables that override option defaults.
pub const ENV_PREFIX: &str = "OOPMAP_";

/// The default for `max_omv_count`. Real compilers stay far below it.
pub const DEFAULT_MAX_OMV_COUNT: usize = u16::MAX as usize;

fn always_valid<T>(_: &T) -> bool {
    true
}

macro_rules! options {
    ($($(#[$outer:meta])* $name:ident: $type:ty[$validator:expr] = $default:expr),*,) => [
        options!($($(#[$outer])* $name: $type[$validator] = $default),*);
    ];
    ($($(#[$outer:meta])* $name:ident: $type:ty[$validator:expr] = $default:expr),*) => [
        /// Options that control how oop map images are read and frames are addressed.
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub struct Options {
            $($(#[$outer])* pub $name: $type),*
        }
        impl Options {
            /// Set an option by name from its string form. Returns `false` and keeps the old
            /// value if the name is unknown, the value does not parse, or the validator rejects it.
            pub fn set_from_str(&mut self, s: &str, val: &str) -> bool {
                match s {
                    // Parse the given value (from an env var, set_from_str or set_bulk_by_str)
                    // to the right type
                    $(stringify!($name) => if let Ok(ref val) = val.parse::<$type>() {
                        // Validate
                        let validate_fn = $validator;
                        let is_valid = validate_fn(val);
                        if is_valid {
                            // Only set value if valid.
                            self.$name = val.clone();
                        } else {
                            warn!(
                                "Unable to set {}={:?}. Invalid value. Default value will be used.",
                                s, val
                            );
                        }
                        is_valid
                    } else {
                        warn!(
                            "Unable to set {}={:?}. Cant parse value. Default value will be used.",
                            s, val
                        );
                        false
                    })*
                    _ => {
                        warn!("Unknown option {}", s);
                        false
                    }
                }
            }
        }
        impl Default for Options {
            fn default() -> Self {
                let mut options = Options {
                    $($name: $default),*
                };

                // If we have env vars that start with OOPMAP_ and match any option (such as
                // OOPMAP_STACK_SLOT_SIZE), we set the option to its value (if it is a valid
                // value). Otherwise, use the default value.
                for (key, val) in std::env::vars() {
                    // strip the prefix, and get the lower case string
                    if let Some(rest_of_key) = key.strip_prefix(ENV_PREFIX) {
                        let lowercase: &str = &rest_of_key.to_lowercase();
                        match lowercase {
                            $(stringify!($name) => { options.set_from_str(lowercase, &val); },)*
                            _ => {}
                        }
                    }
                }
                options
            }
        }
    ]
}

options! {
    /// Size in bytes of the unit stack offsets are counted in.
    stack_slot_size:       usize [|v: &usize| *v > 0] = 1,
    /// Subtract stack offsets from the frame base instead of adding them.
    negate_stack_offsets:  bool  [always_valid]       = false,
    /// Largest `omv_count` accepted when reading an image. Larger counts are treated as corruption.
    max_omv_count:         usize [|v: &usize| *v > 0] = DEFAULT_MAX_OMV_COUNT,
    /// Treat dead values in an image as corruption. Emitters that drop dead values set this.
    reject_dead_values:    bool  [always_valid]       = false,
}

impl Options {
    /// Set options from a string of whitespace separated `key=value` pairs, e.g.
    /// `"stack_slot_size=4 negate_stack_offsets=true"`. Returns true if every pair was applied.
    pub fn set_bulk_by_str(&mut self, options: &str) -> bool {
        options.split_ascii_whitespace().fold(true, |all_ok, pair| {
            let ok = match pair.split_once('=') {
                Some((key, value)) => self.set_from_str(key, value),
                None => {
                    warn!("Option {:?} is not a key=value pair", pair);
                    false
                }
            };
            all_ok && ok
        })
    }
}
