use once_cell::sync::Lazy;
use regex::Regex;

static SWIFT_IDENTIFIER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok());

static JAVA_QUALIFIED_NAME: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$").ok()
});

/// Reserved in declarations, statements and expressions; `_` is not an identifier
const SWIFT_KEYWORDS: &[&str] = &[
    "_", "Any", "Self", "as", "associatedtype", "break", "case", "catch", "class",
    "continue", "default", "defer", "deinit", "do", "else", "enum", "extension",
    "fallthrough", "false", "fileprivate", "for", "func", "guard", "if", "import", "in",
    "init", "inout", "internal", "is", "let", "nil", "open", "operator", "private",
    "precedencegroup", "protocol", "public", "repeat", "rethrows", "return", "self",
    "static", "struct", "subscript", "super", "switch", "throw", "throws", "true", "try",
    "typealias", "var", "where", "while",
];

/// Keywords plus the `true`, `false` and `null` literals
const JAVA_KEYWORDS: &[&str] = &[
    "_", "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char",
    "class", "const", "continue", "default", "do", "double", "else", "enum", "extends",
    "false", "final", "finally", "float", "for", "goto", "if", "implements", "import",
    "instanceof", "int", "interface", "long", "native", "new", "null", "package",
    "private", "protected", "public", "return", "short", "static", "strictfp", "super",
    "switch", "synchronized", "this", "throw", "throws", "transient", "true", "try",
    "void", "volatile", "while",
];

pub fn is_swift_identifier(name: &str) -> bool {
    SWIFT_IDENTIFIER
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(name))
        && !SWIFT_KEYWORDS.contains(&name)
}

/// Fully-qualified Java class name, e.g. `expo.modules.camera.CameraModule`.
/// No segment may be a reserved word.
pub fn is_java_qualified_name(name: &str) -> bool {
    JAVA_QUALIFIED_NAME
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(name))
        && name.split('.').all(|segment| !JAVA_KEYWORDS.contains(&segment))
}

/// Escape a value for a double-quoted Swift or Java string literal
pub fn escape_string_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
