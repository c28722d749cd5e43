//! HTML rendering for the dashboard pages. Markup only; no decisions here.

use crate::form_builder::FieldControl;
use crate::inference::PredictionResult;
use crate::model::ModelInfo;
use crate::record::{format_number, InputRecord};

/// What the prediction page shows below the form
pub enum PageOutcome<'a> {
    Resolved(&'a PredictionResult),
    Invalid(&'a str),
    Failed(&'a str),
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = r#"
body { background: #2b2b2b; color: white; font-family: sans-serif; margin: 0; }
nav { background: black; padding: 12px; }
nav a { color: white; margin-right: 16px; text-decoration: none; font-size: 18px; }
nav a:hover { color: #ff9700; }
main { padding: 24px; max-width: 960px; }
h1 { color: #ff9700; text-align: center; }
label { display: block; margin-top: 12px; }
button { background: #ff9700; color: white; font-size: 20px; border: none; padding: 8px 48px; margin-top: 16px; }
.help { color: #bbbbbb; font-size: 12px; }
.alert-box { background: rgba(255, 0, 0, 0.8); color: white; padding: 15px; border-radius: 5px; text-align: center; font-weight: bold; font-size: 18px; margin-top: 16px; }
.alert-box.positive { background: rgba(0, 128, 0, 0.8); }
.alert-box.failure { background: rgba(128, 128, 128, 0.8); }
table { border-collapse: collapse; margin-top: 8px; }
td, th { border: 1px solid #666; padding: 4px 8px; }
"#;

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title><style>{STYLE}</style></head>\
         <body><nav><a href=\"/\">Home</a><a href=\"/predict\">Churn Prediction</a><a href=\"/model-info\">Model Info</a></nav>\
         <main>{body}</main></body></html>",
        title = escape_html(title),
    )
}

pub fn home_page() -> String {
    layout(
        "Customer Churn Prediction",
        "<h1>WELCOME TO CUSTOMER CHURN PREDICTION APP</h1>\
         <p>Enter details about a customer or employee on the Churn Prediction page. \
         The pretrained pipeline predicts their tier and whether they are likely to stay or leave.</p>\
         <p><a href=\"/predict\" style=\"color:#ff9700\">Start a prediction</a></p>",
    )
}

fn render_control(control: &FieldControl) -> String {
    match control {
        FieldControl::Select {
            name,
            label,
            help,
            options,
            selected,
        } => {
            let options: String = options
                .iter()
                .map(|option| {
                    let marker = if option == selected { " selected" } else { "" };
                    format!(
                        "<option value=\"{v}\"{marker}>{v}</option>",
                        v = escape_html(option)
                    )
                })
                .collect();
            format!(
                "<label>{label}<br><select name=\"{name}\">{options}</select></label><span class=\"help\">{help}</span>",
                label = escape_html(label),
                name = escape_html(name),
                help = escape_html(help),
            )
        }
        FieldControl::Slider {
            name,
            label,
            help,
            min,
            max,
            value,
        } => format!(
            "<label>{label} <output>{value}</output><br>\
             <input type=\"range\" name=\"{name}\" min=\"{min}\" max=\"{max}\" value=\"{value}\" step=\"any\" \
             oninput=\"this.previousElementSibling.previousElementSibling.value=this.value\"></label>\
             <span class=\"help\">{help}</span>",
            label = escape_html(label),
            name = escape_html(name),
            help = escape_html(help),
            min = format_number(*min),
            max = format_number(*max),
            value = format_number(*value),
        ),
    }
}

fn render_record(record: &InputRecord) -> String {
    let header: String = record
        .names()
        .map(|name| format!("<th>{}</th>", escape_html(name)))
        .collect();
    let cells: String = record
        .iter()
        .map(|(_, value)| format!("<td>{}</td>", escape_html(&value.to_string())))
        .collect();
    format!(
        "<details><summary>See Input Data</summary><table><tr>{header}</tr><tr>{cells}</tr></table></details>"
    )
}

fn render_outcome(outcome: &PageOutcome<'_>) -> String {
    match outcome {
        PageOutcome::Resolved(result) if result.is_positive_outcome => format!(
            "<div class=\"alert-box positive\">GREAT NEWS: The employee is likely to STAY! (prediction: {})</div>",
            escape_html(&result.display_label)
        ),
        PageOutcome::Resolved(result) => format!(
            "<div class=\"alert-box\">ALERT: The employee is likely to LEAVE! (prediction: {})</div>",
            escape_html(&result.display_label)
        ),
        PageOutcome::Invalid(message) => format!(
            "<div class=\"alert-box failure\">Invalid input: {}</div>",
            escape_html(message)
        ),
        PageOutcome::Failed(message) => format!(
            "<div class=\"alert-box failure\">Prediction failed: {}</div>",
            escape_html(message)
        ),
    }
}

pub fn prediction_page(
    controls: &[FieldControl],
    record: Option<&InputRecord>,
    outcome: Option<PageOutcome<'_>>,
) -> String {
    let (selects, sliders): (Vec<_>, Vec<_>) = controls
        .iter()
        .partition(|c| matches!(c, FieldControl::Select { .. }));
    let selects: String = selects.into_iter().map(render_control).collect();
    let sliders: String = sliders.into_iter().map(render_control).collect();

    let mut body = format!(
        "<h2>Churn Prediction</h2><form method=\"post\" action=\"/predict\">\
         <h3>Categorical Features</h3>{selects}<h3>Numerical Features</h3>{sliders}\
         <br><button type=\"submit\">Predict Churn</button></form>"
    );
    if let Some(record) = record {
        body.push_str(&render_record(record));
    }
    if let Some(outcome) = outcome {
        body.push_str(&render_outcome(&outcome));
    }
    layout("Churn Prediction", &body)
}

pub fn model_info_page(info: &ModelInfo) -> String {
    let classes: Vec<String> = info.classes.iter().map(ToString::to_string).collect();
    let rows = [
        ("Model", info.name.clone()),
        ("Type", info.kind.clone()),
        (
            "Description",
            info.description.clone().unwrap_or_else(|| "-".to_string()),
        ),
        (
            "Format version",
            info.format_version
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        ("Output classes", classes.join(", ")),
        ("Input features", info.input_columns.join(", ")),
        (
            "Fingerprint (SHA-256)",
            info.fingerprint.clone().unwrap_or_else(|| "-".to_string()),
        ),
    ];
    let table: String = rows
        .iter()
        .map(|(key, value)| {
            format!(
                "<tr><th>{}</th><td>{}</td></tr>",
                escape_html(key),
                escape_html(value)
            )
        })
        .collect();
    layout(
        "Model Information",
        &format!(
            "<h2>Model Information</h2><p>This app uses a pretrained pipeline for predicting customer churn.</p><table>{table}</table>"
        ),
    )
}
