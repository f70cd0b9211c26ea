//! Java source emission helpers.
//!
//! [`JavaFile`] accumulates a class body and the imports it needs. Type
//! references go through [`JavaFile::type_name`], which imports a type when
//! its simple name is free and falls back to the qualified name otherwise.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as FmtWrite;

use aot_model::types::package_of;
use aot_model::ResolvableType;

/// First line of every generated source file.
pub const GENERATED_HEADER: &str = "// Generated by aot-codegen. Do not edit.";

const INDENT: &str = "  ";

/// A Java compilation unit under construction.
#[derive(Debug)]
pub struct JavaFile {
    package: String,
    imports: BTreeSet<String>,
    claimed: HashMap<String, String>,
    indent: usize,
    /// The class body.
    pub buf: String,
}

impl JavaFile {
    /// Creates a file for the top-level class `class_name` in `package`.
    #[must_use]
    pub fn new(package: &str, class_name: &str) -> Self {
        let mut claimed = HashMap::new();
        claimed.insert(class_name.to_string(), qualify(package, class_name));
        Self {
            package: package.to_string(),
            imports: BTreeSet::new(),
            claimed,
            indent: 0,
            buf: String::new(),
        }
    }

    /// Returns how `name` (a binary name, possibly nested with `$` or an
    /// array with `[]`) is written in this file, importing it if needed.
    pub fn type_name(&mut self, name: &str) -> String {
        if let Some(element) = name.strip_suffix("[]") {
            return format!("{}[]", self.type_name(element));
        }
        if !name.contains('.') {
            return name.replace('$', ".");
        }
        let (outer, nested) = match name.split_once('$') {
            Some((outer, nested)) => (outer, Some(nested.replace('$', "."))),
            None => (name, None),
        };
        let simple = outer.rsplit('.').next().unwrap_or(outer).to_string();
        let package = package_of(outer);

        let available = match self.claimed.get(&simple) {
            Some(owner) => owner == outer,
            None => {
                self.claimed.insert(simple.clone(), outer.to_string());
                true
            }
        };
        let head = if !available {
            outer.to_string()
        } else {
            if package != "java.lang" && package != self.package {
                self.imports.insert(outer.to_string());
            }
            simple
        };
        match nested {
            Some(nested) => format!("{head}.{nested}"),
            None => head,
        }
    }

    /// Like [`JavaFile::type_name`], with generic arguments.
    pub fn type_ref(&mut self, ty: &ResolvableType) -> String {
        let mut out = self.type_name(&ty.name);
        if ty.has_generics() {
            let args: Vec<String> = ty.generics.iter().map(|g| self.type_ref(g)).collect();
            let _ = write!(out, "<{}>", args.join(", "));
        }
        out
    }

    /// Appends an indented line.
    pub fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.buf.push_str(INDENT);
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    /// Appends a line and indents what follows.
    pub fn open(&mut self, text: &str) {
        self.line(text);
        self.indent += 1;
    }

    /// Dedents and appends a line.
    pub fn close(&mut self, text: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }

    /// Indents following lines without emitting anything.
    pub fn indent(&mut self) {
        self.indent += 1;
    }

    /// Reverts one [`JavaFile::indent`].
    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Appends a Javadoc block.
    pub fn javadoc(&mut self, text: &str) {
        self.line("/**");
        for line in text.lines() {
            if line.is_empty() {
                self.line(" *");
            } else {
                self.line(&format!(" * {line}"));
            }
        }
        self.line(" */");
    }

    /// Assembles header, package, imports and body.
    #[must_use]
    pub fn finish(self) -> String {
        let mut out = String::with_capacity(self.buf.len() + 256);
        out.push_str(GENERATED_HEADER);
        out.push('\n');
        if !self.package.is_empty() {
            let _ = writeln!(out, "package {};", self.package);
        }
        out.push('\n');
        if !self.imports.is_empty() {
            for import in &self.imports {
                let _ = writeln!(out, "import {import};");
            }
            out.push('\n');
        }
        out.push_str(&self.buf);
        out
    }
}

fn qualify(package: &str, class_name: &str) -> String {
    if package.is_empty() {
        class_name.to_string()
    } else {
        format!("{package}.{class_name}")
    }
}

/// A Java string literal.
#[must_use]
pub fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        escape_into(&mut out, c, '"');
    }
    out.push('"');
    out
}

/// A Java char literal.
#[must_use]
pub fn char_literal(value: char) -> String {
    let mut out = String::from("'");
    escape_into(&mut out, value, '\'');
    out.push('\'');
    out
}

fn escape_into(out: &mut String, c: char, quote: char) {
    match c {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c if c == quote => {
            out.push('\\');
            out.push(c);
        }
        c if c.is_control() => {
            let _ = write!(out, "\\u{:04x}", u32::from(c));
        }
        c => out.push(c),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn imports_are_sorted_and_skip_implicit_packages() {
        let mut f = JavaFile::new("com.example", "ContextBootstrapInitializer");
        assert_eq!(f.type_name("org.springframework.core.env.Environment"), "Environment");
        assert_eq!(f.type_name("java.lang.String"), "String");
        assert_eq!(f.type_name("com.example.Service"), "Service");
        assert_eq!(f.type_name("java.util.List"), "List");
        f.line("class Body {}");
        let out = f.finish();
        assert_eq!(
            out,
            "// Generated by aot-codegen. Do not edit.\npackage com.example;\n\n\
             import java.util.List;\n\
             import org.springframework.core.env.Environment;\n\n\
             class Body {}\n"
        );
    }

    #[test]
    fn conflicting_simple_names_stay_qualified() {
        let mut f = JavaFile::new("com.example", "Config");
        assert_eq!(f.type_name("com.example.a.Service"), "Service");
        assert_eq!(f.type_name("com.example.b.Service"), "com.example.b.Service");
        assert_eq!(f.type_name("com.other.Config"), "com.other.Config");
        assert_eq!(f.type_name("com.example.a.Service"), "Service");
    }

    #[test]
    fn nested_and_generic_types() {
        let mut f = JavaFile::new("com.example", "Init");
        assert_eq!(f.type_name("com.acme.Outer$Inner"), "Outer.Inner");
        assert_eq!(f.type_name("int[]"), "int[]");
        let ty: ResolvableType = "java.util.Map<java.lang.String, com.acme.Outer$Inner>".parse().unwrap();
        assert_eq!(f.type_ref(&ty), "Map<String, Outer.Inner>");
        let out = f.finish();
        assert!(out.contains("import com.acme.Outer;\n"));
        assert!(out.contains("import java.util.Map;\n"));
    }

    #[test]
    fn literals_are_escaped() {
        assert_eq!(string_literal("say \"hi\"\n"), "\"say \\\"hi\\\"\\n\"");
        assert_eq!(char_literal('\''), "'\\''");
        assert_eq!(char_literal('x'), "'x'");
    }

    #[test]
    fn blocks_indent_their_content() {
        let mut f = JavaFile::new("", "Init");
        f.javadoc("Entry point.");
        f.open("public class Init {");
        f.line("int x;");
        f.close("}");
        assert_eq!(f.buf, "/**\n * Entry point.\n */\npublic class Init {\n  int x;\n}\n");
    }
}
