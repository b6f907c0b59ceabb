//! Human-readable rendering of a finished check.

use labelcheck_core::{format_currency, CheckReport, Finding, Locale};

use crate::terminal_output::{paint, render_table, Column, BOLD, DIM, GREEN, RED, YELLOW};

struct Labels {
    product: &'static str,
    verdict_ok: &'static str,
    verdict_failed: &'static str,
    errors: &'static str,
    warnings: &'static str,
    field: &'static str,
    message: &'static str,
    source: &'static str,
    penalty: &'static str,
    recommendation: &'static str,
    mandatory: &'static str,
    present: &'static str,
    missing: &'static str,
    forbidden: &'static str,
    total: &'static str,
    breakdown: &'static str,
}

fn labels(locale: Locale) -> &'static Labels {
    const UK: Labels = Labels {
        product: "Продукт",
        verdict_ok: "Етикетка відповідає вимогам",
        verdict_failed: "Етикетка не відповідає вимогам",
        errors: "Помилки",
        warnings: "Попередження",
        field: "Поле",
        message: "Опис",
        source: "Джерело",
        penalty: "Штраф",
        recommendation: "Рекомендація",
        mandatory: "Обов'язкові поля",
        present: "наявні",
        missing: "відсутні",
        forbidden: "Заборонені фрази",
        total: "Загальна сума штрафів",
        breakdown: "За джерелами",
    };
    const EN: Labels = Labels {
        product: "Product",
        verdict_ok: "The label meets the requirements",
        verdict_failed: "The label does not meet the requirements",
        errors: "Errors",
        warnings: "Warnings",
        field: "Field",
        message: "Message",
        source: "Source",
        penalty: "Penalty",
        recommendation: "Recommendation",
        mandatory: "Mandatory fields",
        present: "present",
        missing: "missing",
        forbidden: "Forbidden phrases",
        total: "Total penalties",
        breakdown: "By source",
    };
    match locale {
        Locale::Uk => &UK,
        Locale::En => &EN,
    }
}

pub fn render_report(report: &CheckReport, locale: Locale, color: bool) -> String {
    let l = labels(locale);
    let mut out = String::new();

    if let Some(name) = report.product_info.name.as_deref() {
        out.push_str(&format!("{}: {name}\n", l.product));
    }

    let verdict = if report.is_valid {
        paint(&format!("✓ {}", l.verdict_ok), GREEN, color)
    } else {
        paint(&format!("✗ {}", l.verdict_failed), RED, color)
    };
    out.push_str(&format!("{verdict}\n"));

    push_findings(&mut out, l, l.errors, &report.errors, RED, color);
    push_findings(&mut out, l, l.warnings, &report.warnings, YELLOW, color);

    if !report.mandatory_present.is_empty() || !report.mandatory_missing.is_empty() {
        out.push_str(&format!("\n{}\n", paint(l.mandatory, BOLD, color)));
        if !report.mandatory_present.is_empty() {
            out.push_str(&format!("  {}: {}\n", l.present, report.mandatory_present.join(", ")));
        }
        if !report.mandatory_missing.is_empty() {
            let missing = report.mandatory_missing.join(", ");
            out.push_str(&format!("  {}: {}\n", l.missing, paint(&missing, RED, color)));
        }
    }

    if !report.forbidden_found.is_empty() {
        out.push_str(&format!("\n{}\n", paint(l.forbidden, BOLD, color)));
        for phrase in &report.forbidden_found {
            out.push_str(&format!("  - {phrase}\n"));
        }
    }

    out.push_str(&format!(
        "\n{}: {}\n",
        paint(l.total, BOLD, color),
        format_currency(report.total_penalty)
    ));
    if !report.penalty_breakdown.is_empty() {
        let rows: Vec<Vec<String>> = report
            .penalty_breakdown
            .iter()
            .map(|line| vec![line.source.clone(), format_currency(line.amount)])
            .collect();
        out.push_str(&format!("{}\n", paint(l.breakdown, DIM, color)));
        out.push_str(&render_table(
            &[Column::left(l.source).max_width(48), Column::right(l.penalty)],
            &rows,
        ));
    }

    out
}

fn push_findings(out: &mut String, l: &Labels, title: &str, findings: &[Finding], style: &str, color: bool) {
    if findings.is_empty() {
        return;
    }
    out.push_str(&format!("\n{} ({})\n", paint(title, style, color), findings.len()));

    let rows: Vec<Vec<String>> = findings
        .iter()
        .map(|f| {
            vec![
                f.field.clone(),
                f.message.clone(),
                f.source.clone(),
                format_currency(f.penalty),
            ]
        })
        .collect();
    out.push_str(&render_table(
        &[
            Column::left(l.field).max_width(24),
            Column::left(l.message).max_width(60),
            Column::left(l.source).max_width(32),
            Column::right(l.penalty),
        ],
        &rows,
    ));

    for f in findings {
        if let Some(tip) = &f.recommendation {
            out.push_str(&format!("  {} ({}): {tip}\n", l.recommendation, f.field));
        }
    }
}
