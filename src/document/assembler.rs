//! Incremental document assembly from predicted symbols

use std::collections::BTreeSet;
use std::sync::Arc;

use super::config::DocumentConfig;
use super::toolchain::{CompileError, CompileReport, Toolchain};
use crate::registry::{SymbolId, SymbolInfo, SymbolRegistry, UnknownSymbolError};

/// Whether any note has been appended yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    Empty,
    NonEmpty,
}

/// Append-only document model: ordered notes plus required packages
///
/// Notes are never removed, so the state only moves from `Empty` to
/// `NonEmpty`. Rendering and compiling borrow the assembler immutably and
/// cannot change it.
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    registry: Arc<SymbolRegistry>,
    config: DocumentConfig,
    notes: Vec<String>,
    packages: BTreeSet<String>,
    font_encodings: BTreeSet<String>,
}

impl DocumentAssembler {
    pub fn new(registry: Arc<SymbolRegistry>, config: DocumentConfig) -> Self {
        Self {
            registry,
            config,
            notes: Vec::new(),
            packages: BTreeSet::new(),
            font_encodings: BTreeSet::new(),
        }
    }

    /// Resolve and append a batch of symbols.
    ///
    /// All-or-nothing: every id is looked up before anything is appended, so
    /// an unknown id leaves the document exactly as it was.
    pub fn add_symbols(&mut self, ids: &[SymbolId]) -> Result<(), UnknownSymbolError> {
        let resolved: Vec<&SymbolInfo> = ids
            .iter()
            .map(|id| self.registry.lookup(id))
            .collect::<Result<_, _>>()?;

        let mut notes = Vec::with_capacity(resolved.len());
        let mut packages = Vec::new();
        let mut font_encodings = Vec::new();
        for info in resolved {
            notes.push(self.render_symbol(info));
            packages.extend(info.package.iter().cloned());
            font_encodings.extend(info.fontenc.iter().cloned());
        }

        self.notes.extend(notes);
        self.packages.extend(packages);
        self.font_encodings.extend(font_encodings);
        log::debug!(
            "event=add_symbols appended={} notes={} packages={}",
            ids.len(),
            self.notes.len(),
            self.packages.len()
        );
        Ok(())
    }

    fn render_symbol(&self, info: &SymbolInfo) -> String {
        if info.mathmode {
            format!(
                "{}{}{}",
                self.config.math_open, info.command, self.config.math_close
            )
        } else {
            info.command.clone()
        }
    }

    pub fn state(&self) -> AssemblerState {
        if self.notes.is_empty() {
            AssemblerState::Empty
        } else {
            AssemblerState::NonEmpty
        }
    }

    /// Rendered notes in append order
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Required packages, sorted
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(String::as_str)
    }

    /// Required font encodings, sorted
    pub fn font_encodings(&self) -> impl Iterator<Item = &str> {
        self.font_encodings.iter().map(String::as_str)
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Full document source for the current state.
    ///
    /// Package lines are sorted so the same state always renders the same
    /// text.
    pub fn render(&self) -> String {
        let mut out = String::from(&self.config.preamble);
        for encoding in &self.font_encodings {
            out.push_str(&format!("\\usepackage[{}]{{fontenc}}\n", encoding));
        }
        for package in &self.packages {
            out.push_str(&format!("\\usepackage{{{}}}\n", package));
        }
        out.push_str(&self.config.body_begin);
        out.push_str(&self.notes.join(&self.config.separator));
        out.push('\n');
        out.push_str(&self.config.epilogue);
        out
    }

    /// Write the rendered document and run the external tools.
    ///
    /// Failures are reported to the caller and logged; the document itself
    /// is untouched either way.
    pub fn compile(&self, toolchain: &Toolchain) -> Result<CompileReport, CompileError> {
        toolchain.compile(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(id: &str, command: &str, mathmode: bool, package: Option<&str>) -> (SymbolId, SymbolInfo) {
        let info = SymbolInfo {
            command: command.to_string(),
            mathmode,
            textmode: !mathmode,
            css_class: id.to_string(),
            package: package.map(str::to_string),
            fontenc: None,
        };
        (SymbolId::from(id), info)
    }

    fn assembler() -> DocumentAssembler {
        let registry = SymbolRegistry::from_entries([
            entry("plus", "+", true, None),
            entry("x", "x", false, None),
            entry("equals", "=", true, None),
            entry("therefore", "\\therefore", true, Some("amssymb")),
            entry("because", "\\because", true, Some("amssymb")),
            entry("celsius", "\\celsius", false, Some("gensymb")),
        ]);
        DocumentAssembler::new(Arc::new(registry), DocumentConfig::default())
    }

    fn ids(names: &[&str]) -> Vec<SymbolId> {
        names.iter().map(|n| SymbolId::from(*n)).collect()
    }

    #[test]
    fn test_starts_empty() {
        let doc = assembler();
        assert_eq!(doc.state(), AssemblerState::Empty);
        assert!(doc.notes().is_empty());
    }

    #[test]
    fn test_empty_render() {
        let doc = assembler();
        assert_eq!(
            doc.render(),
            "\\documentclass[12pt,oneside]{article}\n\\usepackage[margin=1in]{geometry}\n\\begin{document}\n\n\\end{document}\n"
        );
    }

    #[test]
    fn test_math_symbols_wrapped() {
        let mut doc = assembler();
        doc.add_symbols(&ids(&["plus", "x"])).unwrap();
        assert_eq!(doc.notes(), &["$+$".to_string(), "x".to_string()]);
        assert_eq!(doc.state(), AssemblerState::NonEmpty);
    }

    #[test]
    fn test_append_across_calls() {
        let mut doc = assembler();
        doc.add_symbols(&ids(&["plus"])).unwrap();
        doc.add_symbols(&ids(&["x"])).unwrap();
        doc.add_symbols(&ids(&["equals"])).unwrap();
        assert!(doc.render().contains("\\begin{document}\n$+$ x $=$\n\\end{document}"));
    }

    #[test]
    fn test_shared_package_emitted_once() {
        let mut doc = assembler();
        doc.add_symbols(&ids(&["therefore", "because", "therefore"]))
            .unwrap();
        let rendered = doc.render();
        assert_eq!(rendered.matches("\\usepackage{amssymb}").count(), 1);
    }

    #[test]
    fn test_packages_sorted() {
        let mut doc = assembler();
        doc.add_symbols(&ids(&["celsius", "therefore"])).unwrap();
        let packages: Vec<&str> = doc.packages().collect();
        assert_eq!(packages, vec!["amssymb", "gensymb"]);

        let rendered = doc.render();
        let amssymb = rendered.find("\\usepackage{amssymb}").unwrap();
        let gensymb = rendered.find("\\usepackage{gensymb}").unwrap();
        let body = rendered.find("\\begin{document}").unwrap();
        assert!(amssymb < gensymb && gensymb < body);
    }

    #[test]
    fn test_unknown_symbol_leaves_state_untouched() {
        let mut doc = assembler();
        doc.add_symbols(&ids(&["x"])).unwrap();
        let before = doc.render();

        let err = doc
            .add_symbols(&ids(&["therefore", "nope", "plus"]))
            .unwrap_err();
        assert_eq!(err.id, SymbolId::from("nope"));
        assert_eq!(doc.render(), before);
        assert_eq!(doc.notes().len(), 1);
        assert_eq!(doc.packages().count(), 0);
    }

    #[test]
    fn test_failed_first_batch_stays_empty() {
        let mut doc = assembler();
        assert!(doc.add_symbols(&ids(&["nope"])).is_err());
        assert_eq!(doc.state(), AssemblerState::Empty);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let mut doc = assembler();
        doc.add_symbols(&[]).unwrap();
        assert_eq!(doc.state(), AssemblerState::Empty);
    }

    #[test]
    fn test_font_encoding_line() {
        let (id, mut guillemot) = entry("guillemotleft", "\\guillemotleft", false, None);
        guillemot.fontenc = Some("T1".to_string());
        let registry = SymbolRegistry::from_entries([(id, guillemot)]);
        let mut doc = DocumentAssembler::new(Arc::new(registry), DocumentConfig::default());

        doc.add_symbols(&ids(&["guillemotleft"])).unwrap();
        assert!(doc.render().contains("\\usepackage[T1]{fontenc}\n"));
    }

    #[test]
    fn test_custom_delimiters_and_separator() {
        let registry = SymbolRegistry::from_entries([
            entry("plus", "+", true, None),
            entry("x", "x", false, None),
        ]);
        let config = DocumentConfig::new()
            .with_math_delimiters("\\(", "\\)")
            .with_separator("\n");
        let mut doc = DocumentAssembler::new(Arc::new(registry), config);
        doc.add_symbols(&ids(&["x", "plus"])).unwrap();
        insta::assert_snapshot!(doc.notes().join("|"), @r"x|\(+\)");
    }
}
