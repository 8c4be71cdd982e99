//! Per-target file name grammar
//!
//! Each generation target accepts a different extension and identifier
//! alphabet. Checks run in a fixed order so every rejection names the exact
//! rule that was violated.

use thiserror::Error;

use crate::plugin::Source;

/// Characters that are hostile to at least one supported filesystem.
const FORBIDDEN_CHARACTERS: &[char] = &[':', '/', '\\', '?', '*', '"', '<', '>', '|'];

/// File name validation errors, one variant per grammar rule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileNameError {
    #[error("File name is empty")]
    Empty,

    #[error("File name '{name}' must end with '.{expected}'")]
    MissingExtension { name: String, expected: &'static str },

    #[error("File name '{name}' has no base name before the extension")]
    EmptyBaseName { name: String },

    #[error("File name '{name}' starts with '{found}'; expected a letter, '_' or '{sigil}'")]
    InvalidStartCharacter {
        name: String,
        found: char,
        sigil: char,
    },

    #[error("File name '{name}' contains forbidden characters: {found:?}")]
    InvalidCharacters { name: String, found: Vec<char> },
}

struct Grammar {
    extension: &'static str,
    /// Extra character allowed at the start of the base name, besides
    /// letters and underscore.
    sigil: char,
}

fn grammar_for(source: Source) -> Grammar {
    match source {
        Source::Ios => Grammar {
            extension: "swift",
            sigil: '+',
        },
        Source::Android => Grammar {
            extension: "kt",
            sigil: '$',
        },
        Source::Web => Grammar {
            extension: "ts",
            sigil: '$',
        },
    }
}

/// Validate a candidate file name against the grammar of one target.
///
/// Order: empty, extension, empty base name, start character, forbidden
/// character scan.
pub fn validate_file_name(name: &str, source: Source) -> Result<(), FileNameError> {
    let grammar = grammar_for(source);

    if name.is_empty() {
        return Err(FileNameError::Empty);
    }

    let suffix = format!(".{}", grammar.extension);
    let base = name
        .strip_suffix(suffix.as_str())
        .ok_or_else(|| FileNameError::MissingExtension {
            name: name.to_string(),
            expected: grammar.extension,
        })?;

    let mut chars = base.chars();
    match chars.next() {
        None => {
            return Err(FileNameError::EmptyBaseName {
                name: name.to_string(),
            })
        }
        Some(first) => {
            if !(first.is_alphabetic() || first == '_' || first == grammar.sigil) {
                return Err(FileNameError::InvalidStartCharacter {
                    name: name.to_string(),
                    found: first,
                    sigil: grammar.sigil,
                });
            }
        }
    }

    let found: Vec<char> = base
        .chars()
        .filter(|c| FORBIDDEN_CHARACTERS.contains(c))
        .collect();
    if !found.is_empty() {
        return Err(FileNameError::InvalidCharacters {
            name: name.to_string(),
            found,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names_per_target() {
        validate_file_name("TrackingEvents.swift", Source::Ios).unwrap();
        validate_file_name("_Internal.swift", Source::Ios).unwrap();
        validate_file_name("+Analytics.swift", Source::Ios).unwrap();
        validate_file_name("TrackingEvents.kt", Source::Android).unwrap();
        validate_file_name("$generated.ts", Source::Web).unwrap();
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(
            validate_file_name("", Source::Ios),
            Err(FileNameError::Empty)
        );
    }

    #[test]
    fn test_wrong_extension() {
        let err = validate_file_name("Events.txt", Source::Android).unwrap_err();
        assert!(matches!(
            err,
            FileNameError::MissingExtension { expected: "kt", .. }
        ));
    }

    #[test]
    fn test_extension_only() {
        let err = validate_file_name(".swift", Source::Ios).unwrap_err();
        assert!(matches!(err, FileNameError::EmptyBaseName { .. }));
    }

    #[test]
    fn test_digit_start_rejected() {
        let err = validate_file_name("2Events.kt", Source::Android).unwrap_err();
        assert!(matches!(
            err,
            FileNameError::InvalidStartCharacter { found: '2', .. }
        ));
    }

    #[test]
    fn test_sigil_is_target_specific() {
        // '+' starts an iOS name but not an Android one
        validate_file_name("+Events.swift", Source::Ios).unwrap();
        let err = validate_file_name("+Events.kt", Source::Android).unwrap_err();
        assert!(matches!(err, FileNameError::InvalidStartCharacter { .. }));
    }

    #[test]
    fn test_forbidden_characters() {
        let err = validate_file_name("Events|File.kt", Source::Android).unwrap_err();
        assert_eq!(
            err,
            FileNameError::InvalidCharacters {
                name: "Events|File.kt".to_string(),
                found: vec!['|'],
            }
        );
    }

    #[test]
    fn test_all_forbidden_characters_reported() {
        let err = validate_file_name("a:b?c.ts", Source::Web).unwrap_err();
        assert!(matches!(
            err,
            FileNameError::InvalidCharacters { ref found, .. } if found == &[':', '?']
        ));
    }
}
