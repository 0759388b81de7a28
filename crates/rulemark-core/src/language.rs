//! Language registry lookup.

use std::fmt;

/// A language known to the rule registry.
///
/// Rule descriptions reference a target language with free-text labels
/// (`"C#"`, `"js"`, `"PL/SQL"`); the registry itself speaks canonical
/// lowercase codes. [`Language::from_label`] bridges the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Abap,
    Apex,
    C,
    Cobol,
    Cpp,
    CSharp,
    Css,
    Flex,
    Go,
    Html,
    Java,
    JavaScript,
    Kotlin,
    ObjectiveC,
    Php,
    Pli,
    Plsql,
    Python,
    Rpg,
    Ruby,
    Rust,
    Scala,
    Swift,
    Tsql,
    TypeScript,
    VisualBasic,
    VbNet,
    Xml,
}

impl Language {
    /// Resolves a free-text label to a registry language. Matching ignores
    /// case and surrounding whitespace; an unknown label yields `None`.
    pub fn from_label(label: &str) -> Option<Language> {
        let normalized = label.trim().to_ascii_lowercase();
        let language = match normalized.as_str() {
            "abap" => Language::Abap,
            "apex" => Language::Apex,
            "c" => Language::C,
            "cobol" => Language::Cobol,
            "c++" | "cpp" => Language::Cpp,
            "c#" | "cs" | "csharp" => Language::CSharp,
            "css" => Language::Css,
            "flex" | "actionscript" => Language::Flex,
            "go" | "golang" => Language::Go,
            "html" | "web" => Language::Html,
            "java" => Language::Java,
            "javascript" | "js" => Language::JavaScript,
            "kotlin" => Language::Kotlin,
            "objective-c" | "objectivec" | "objc" => Language::ObjectiveC,
            "php" => Language::Php,
            "pl/i" | "pli" => Language::Pli,
            "pl/sql" | "plsql" => Language::Plsql,
            "python" | "py" => Language::Python,
            "rpg" => Language::Rpg,
            "ruby" => Language::Ruby,
            "rust" => Language::Rust,
            "scala" => Language::Scala,
            "swift" => Language::Swift,
            "t-sql" | "tsql" => Language::Tsql,
            "typescript" | "ts" => Language::TypeScript,
            "vb" | "vb6" | "visual basic" => Language::VisualBasic,
            "vb.net" | "vbnet" => Language::VbNet,
            "xml" => Language::Xml,
            _ => return None,
        };
        Some(language)
    }

    /// Canonical registry code, as used in `{rule:<code>:S<number>}` macros.
    pub fn key(self) -> &'static str {
        match self {
            Language::Abap => "abap",
            Language::Apex => "apex",
            Language::C => "c",
            Language::Cobol => "cobol",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Css => "css",
            Language::Flex => "flex",
            Language::Go => "go",
            Language::Html => "html",
            Language::Java => "java",
            Language::JavaScript => "javascript",
            Language::Kotlin => "kotlin",
            Language::ObjectiveC => "objc",
            Language::Php => "php",
            Language::Pli => "pli",
            Language::Plsql => "plsql",
            Language::Python => "python",
            Language::Rpg => "rpg",
            Language::Ruby => "ruby",
            Language::Rust => "rust",
            Language::Scala => "scala",
            Language::Swift => "swift",
            Language::Tsql => "tsql",
            Language::TypeScript => "typescript",
            Language::VisualBasic => "vb",
            Language::VbNet => "vbnet",
            Language::Xml => "xml",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::Language;

    #[test]
    fn labels_resolve_ignoring_case_and_spacing() {
        assert_eq!(Language::from_label("Java"), Some(Language::Java));
        assert_eq!(Language::from_label(" C# "), Some(Language::CSharp));
        assert_eq!(Language::from_label("PL/SQL"), Some(Language::Plsql));
        assert_eq!(Language::from_label("js"), Some(Language::JavaScript));
    }

    #[test]
    fn unknown_labels_resolve_to_none() {
        assert_eq!(Language::from_label(""), None);
        assert_eq!(Language::from_label("klingon"), None);
    }

    #[test]
    fn keys_are_canonical_codes() {
        assert_eq!(Language::CSharp.key(), "csharp");
        assert_eq!(Language::ObjectiveC.key(), "objc");
        assert_eq!(Language::Cpp.to_string(), "cpp");
    }
}
