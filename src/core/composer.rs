/// Field composition: guarded clauses → one paragraph of prose.

use crate::core::template::{FieldSpec, Slots, Template, TemplateSegment};

/// Stateless composer for narrative fields.
pub struct FieldComposer;

impl FieldComposer {
    /// Render every applicable clause and join them. Slot values are copied
    /// verbatim; only the template text around them is tidied.
    /// Identical inputs always produce identical output.
    pub fn compose(spec: &FieldSpec, slots: &Slots) -> String {
        let parts: Vec<String> = spec
            .clauses
            .iter()
            .filter(|clause| clause.applies(slots))
            .map(|clause| render_tidy(&clause.template, slots))
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            return String::new();
        }

        let mut text = parts.join(&spec.joiner);
        text.push_str(&spec.terminator);
        text
    }
}

/// Render a template, collapsing the spacing that empty slots leave behind
/// in the literal text.
pub fn render_tidy(template: &Template, slots: &Slots) -> String {
    let mut tidy = Tidy::default();
    for segment in &template.segments {
        match segment {
            TemplateSegment::Literal(text) => tidy.literal(text),
            TemplateSegment::Slot { name, filter } => {
                let value = slots.get(name).map(String::as_str).unwrap_or("");
                match filter {
                    Some(f) => tidy.value(&f.apply(value)),
                    None => tidy.value(value),
                }
            }
        }
    }
    tidy.finish()
}

/// Literal text: runs of spaces collapse, spaces before `,` / `.` and
/// around line breaks drop, nothing leads or trails. Values are untouched.
#[derive(Default)]
struct Tidy {
    out: String,
    pending_space: bool,
    /// Bytes before this offset came from a slot value.
    fixed: usize,
}

impl Tidy {
    fn literal(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                ' ' | '\t' => self.pending_space = true,
                ',' | '.' => {
                    self.pending_space = false;
                    self.out.push(c);
                }
                '\n' => {
                    self.pending_space = false;
                    while self.out.len() > self.fixed && self.out.ends_with(' ') {
                        self.out.pop();
                    }
                    if !self.out.is_empty() {
                        self.out.push(c);
                    }
                }
                _ => {
                    self.flush_space();
                    self.out.push(c);
                }
            }
        }
    }

    fn value(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.flush_space();
        self.out.push_str(text);
        self.fixed = self.out.len();
    }

    fn flush_space(&mut self) {
        if self.pending_space && !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push(' ');
        }
        self.pending_space = false;
    }

    fn finish(mut self) -> String {
        let keep = self.fixed + self.out[self.fixed..].trim_end().len();
        self.out.truncate(keep);
        self.out
    }
}
