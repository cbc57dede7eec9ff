//! Report rendering
//!
//! Turns an evaluated sheet into a Markdown or LaTeX table. Rendering is
//! pure string building over the analysis results; declarations that failed
//! a pass show a dash instead of a value, so a report is always produced.

use crate::check::Analysis;
use crate::eval::{Evaluation, Value};
use crate::resolve::ResolvedDocument;

/// Output flavor of a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Markdown,
    Latex,
}

/// Rendering options, typically loaded from `metrica.toml`.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub format: ReportFormat,
    /// Significant decimal places for displayed values.
    pub precision: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            format: ReportFormat::Markdown,
            precision: 3,
        }
    }
}

/// Render the whole sheet in declaration order.
pub fn render(
    resolved: &ResolvedDocument,
    analysis: &Analysis,
    evaluation: &Evaluation,
    options: &ReportOptions,
) -> String {
    match options.format {
        ReportFormat::Markdown => render_markdown(resolved, analysis, evaluation, options),
        ReportFormat::Latex => render_latex(resolved, analysis, evaluation, options),
    }
}

fn render_markdown(
    resolved: &ResolvedDocument,
    analysis: &Analysis,
    evaluation: &Evaluation,
    options: &ReportOptions,
) -> String {
    let mut out = String::from("| Name | Label | Value | Unit |\n|---|---|---|---|\n");
    for (id, declaration) in resolved.scope.iter() {
        let label = declaration.label.as_deref().unwrap_or("");
        let (value, unit) = match evaluation.value(id) {
            Some(Value::Quantity(quantity)) => (
                format_number(quantity.converted_value(), options.precision),
                quantity.unit().to_display_string(),
            ),
            Some(Value::Text(text)) => (text.clone(), String::new()),
            None if analysis.has_circular_reference(id) => {
                ("circular".to_string(), String::new())
            }
            None => ("—".to_string(), String::new()),
        };
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            declaration.name, label, value, unit
        ));
    }
    out
}

fn render_latex(
    resolved: &ResolvedDocument,
    analysis: &Analysis,
    evaluation: &Evaluation,
    options: &ReportOptions,
) -> String {
    let mut out = String::from("\\begin{tabular}{llll}\n");
    out.push_str("Name & Label & Value & Unit \\\\\n\\hline\n");
    for (id, declaration) in resolved.scope.iter() {
        let label = declaration
            .label
            .as_deref()
            .map(|l| format!("${l}$"))
            .unwrap_or_default();
        let (value, unit) = match evaluation.value(id) {
            Some(Value::Quantity(quantity)) => (
                format_number(quantity.converted_value(), options.precision),
                format!("${}$", quantity.unit().to_latex_string()),
            ),
            Some(Value::Text(text)) => (text.clone(), String::new()),
            None if analysis.has_circular_reference(id) => {
                ("circular".to_string(), String::new())
            }
            None => ("--".to_string(), String::new()),
        };
        out.push_str(&format!(
            "{} & {} & {} & {} \\\\\n",
            declaration.name, label, value, unit
        ));
    }
    out.push_str("\\end{tabular}\n");
    out
}

/// Fixed-precision formatting with trailing zeros trimmed: `20000`, `4.2`,
/// `0.333`.
pub fn format_number(value: f64, precision: usize) -> String {
    let formatted = format!("{value:.precision$}");
    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::analyze;
    use crate::diagnostics::{Reporter, SourceFile};
    use crate::eval::evaluate;
    use crate::lexer::lex;
    use crate::parser::parse;
    use crate::resolve::resolve;
    use crate::units::UnitRegistry;

    fn render_source(source: &str, options: &ReportOptions) -> String {
        let registry = UnitRegistry::global();
        let mut reporter = Reporter::new(SourceFile::new("test.mt", source));
        let tokens = lex(source, &mut reporter);
        let document = parse(&tokens, &mut reporter);
        let resolved = resolve(document, &mut reporter);
        let analysis = analyze(&resolved, registry, &mut reporter);
        let evaluation = evaluate(&resolved, &analysis, registry);
        render(&resolved, &analysis, &evaluation, options)
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(20_000.0, 3), "20000");
        assert_eq!(format_number(4.2, 3), "4.2");
        assert_eq!(format_number(1.0 / 3.0, 3), "0.333");
        assert_eq!(format_number(-2.5, 1), "-2.5");
    }

    #[test]
    fn test_markdown_report_row() {
        let report = render_source(
            "area <A> {mm^2} = 100 {mm} * 200 {mm}",
            &ReportOptions::default(),
        );
        assert!(report.contains("| area | A | 20000 | mm^2 |"));
    }

    #[test]
    fn test_markdown_report_marks_failed_rows() {
        let report = render_source("x = 13 + y\ny = 25 + x", &ReportOptions::default());
        assert!(report.contains("| x |  | circular |  |"));
    }

    #[test]
    fn test_latex_report_contains_unit() {
        let options = ReportOptions {
            format: ReportFormat::Latex,
            precision: 3,
        };
        let report = render_source("area <A> {mm^2} = 100 {mm} * 200 {mm}", &options);
        assert!(report.contains("\\begin{tabular}"));
        assert!(report.contains("$A$"));
        assert!(report.contains("\\text{ mm}^{2}"));
    }
}
