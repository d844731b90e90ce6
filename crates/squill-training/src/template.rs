//! Prompt template rendering.
//!
//! Templates are plain text with `{placeholder}` substitution over a fixed
//! variable set. Unknown placeholders pass through verbatim, so literal
//! braces in demonstration SQL survive. Rendering is a pure function of the
//! template and the variables.

/// The fixed demonstration block available to templates as `{few_shot}`.
pub const FEW_SHOT: &str = "How many farms are there?\nSELECT count(*) FROM farm\nWhat is the average, minimum, and maximum age for all French singers?\nSELECT avg(age), min(age), max(age) FROM singer WHERE country = 'France'\nShow the ID of the high schooler named Kyle.\nSELECT ID FROM Highschooler WHERE name = 'Kyle'";

/// Variable values for one record.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    pub question: String,
    /// Simplified DDL, one table per line.
    pub schema_ddl: String,
    /// Full CREATE TABLE text, one table per line.
    pub full_ddl: String,
    /// Foreign-key strings, one per line.
    pub foreign_keys: String,
    /// Live cell-value samples, one table per line.
    pub data_samples: String,
    /// Fixed demonstration block.
    pub few_shot: String,
}

impl TemplateVars {
    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "question" => Some(&self.question),
            "schema_ddl" => Some(&self.schema_ddl),
            "full_ddl" => Some(&self.full_ddl),
            "foreign_keys" => Some(&self.foreign_keys),
            "data_samples" => Some(&self.data_samples),
            "few_shot" => Some(&self.few_shot),
            _ => None,
        }
    }
}

/// Renders a template by substituting `{name}` placeholders.
#[must_use]
pub fn render(template: &str, vars: &TemplateVars) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find('}') {
            Some(close) => {
                let name = &after_open[..close];
                if let Some(value) = vars.lookup(name) {
                    out.push_str(value);
                } else {
                    // Unknown placeholder (or literal braces): keep verbatim.
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
                rest = &after_open[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
