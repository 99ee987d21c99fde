//! Plain-text rendering of command results.

use std::fmt::Write;

use tracker_core::models::{Identity, Project, Report};

/// Left-aligned columns separated by two spaces.
fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, headers.iter().copied(), &widths);
    for row in rows {
        push_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    let _ = writeln!(out, "{}", padded.join("  ").trim_end());
}

pub fn projects(projects: &[Project]) -> String {
    if projects.is_empty() {
        return "No projects.\n".to_string();
    }
    let rows: Vec<Vec<String>> = projects
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.title.clone(),
                p.assigned_to
                    .as_ref()
                    .map(|u| u.username.clone())
                    .unwrap_or_else(|| "-".into()),
                p.priority.to_string(),
                p.status.to_string(),
                p.due_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".into()),
                format!("{}%", p.progress),
            ]
        })
        .collect();
    table(
        &["ID", "TITLE", "ASSIGNEE", "PRIORITY", "STATUS", "DUE", "PROGRESS"],
        &rows,
    )
}

pub fn project_detail(project: &Project) -> String {
    let assignee = project
        .assigned_to
        .as_ref()
        .map(|u| format!("{} (id {})", u.username, u.id))
        .unwrap_or_else(|| "-".into());
    let due = project
        .due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".into());
    let description = match project.description.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => "-",
    };
    format!(
        "#{} {}\n\
         Assignee:  {assignee}\n\
         Priority:  {}\n\
         Status:    {}\n\
         Due:       {due}\n\
         Progress:  {}%\n\
         \n\
         {description}\n",
        project.id, project.title, project.priority, project.status, project.progress,
    )
}

pub fn identity(identity: &Identity) -> String {
    let email = if identity.email.is_empty() {
        "-"
    } else {
        identity.email.as_str()
    };
    format!(
        "{} (id {}, {})\nemail: {}\n",
        identity.username,
        identity.id,
        identity.role(),
        email
    )
}

pub fn report(report: &Report) -> String {
    let mut out = format!(
        "Total: {}\nCompleted: {}\nAverage progress: {}%\n",
        report.total,
        report.completed,
        report.avg_progress_percent()
    );
    if !report.by_status.is_empty() {
        out.push('\n');
        let rows: Vec<Vec<String>> = report
            .by_status
            .iter()
            .map(|s| vec![s.status.to_string(), s.count.to_string()])
            .collect();
        out.push_str(&table(&["STATUS", "COUNT"], &rows));
    }
    out
}
