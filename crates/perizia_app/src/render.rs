use perizia_core::{AppViewModel, FieldView, JobPhase, LotDetailView, Metering, MISSING_DETAILS};

/// One-line progress summary, printed whenever the state changes.
pub fn status_line(view: &AppViewModel) -> String {
    match view.phase {
        JobPhase::Idle => {
            let mut line = format!("Ready: {} PDF(s) selected", view.files.len());
            if view.last_rejected > 0 {
                line.push_str(&format!(", {} non-PDF file(s) skipped", view.last_rejected));
            }
            line
        }
        JobPhase::Submitting => format!("Uploading {} PDF(s)...", view.files.len()),
        JobPhase::Polling => format!(
            "Analysis in progress (job {}, {} check(s))",
            view.job_id.as_deref().unwrap_or("?"),
            view.poll_attempts
        ),
        JobPhase::Succeeded => format!("Analysis complete: {} lot(s)", view.lots.len()),
        JobPhase::Failed => format!(
            "Analysis failed: {}",
            view.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

/// Full report of a finished job: lot cards, then the selected lot if any.
pub fn report(view: &AppViewModel) -> Vec<String> {
    let mut lines = vec![status_line(view)];

    for file in &view.files {
        lines.push(format!("  [{}] {} ({} KB)", file.index, file.name, file.size_kb));
    }

    if view.phase == JobPhase::Succeeded {
        lines.push(String::new());
        if view.lots.is_empty() {
            lines.push("No lots found in the result.".to_string());
        }
        for card in &view.lots {
            let value = card
                .summary
                .formatted_value
                .as_deref()
                .unwrap_or("valore n/d");
            lines.push(format!(
                "{:<12} {} | {} | {}",
                card.lot_id, card.label, card.summary.type_label, value
            ));
        }
        if let Some(detail) = &view.selection {
            lines.push(String::new());
            lines.extend(detail_lines(detail));
        }
        if let Some(metering) = &view.metering {
            lines.push(String::new());
            lines.push(metering_line(metering));
        }
    }

    lines
}

fn detail_lines(detail: &LotDetailView) -> Vec<String> {
    let mut lines = vec![format!("== {} ==", detail.label)];
    if detail.fields.is_empty() {
        lines.push(MISSING_DETAILS.to_string());
    }
    for field in &detail.fields {
        lines.extend(field_lines(field));
    }
    lines
}

fn field_lines(field: &FieldView) -> Vec<String> {
    let mut lines = vec![format!(
        "{}: {}",
        field.label,
        field.value.as_deref().unwrap_or("-")
    )];
    if let Some(text) = &field.source_text {
        lines.push(format!("    \"{text}\""));
    }
    for source in &field.sources {
        let document = source.document.as_deref().unwrap_or("documento n/d");
        match &source.page {
            Some(page) => lines.push(format!("    {document} p. {page}")),
            None => lines.push(format!("    {document}")),
        }
    }
    lines
}

fn metering_line(metering: &Metering) -> String {
    let tokens = metering
        .total_tokens
        .map(|t| t.to_string())
        .unwrap_or_else(|| "?".to_string());
    match metering.total_cost {
        Some(cost) => format!("Tokens: {tokens} | Cost: {cost:.4}"),
        None => format!("Tokens: {tokens}"),
    }
}
