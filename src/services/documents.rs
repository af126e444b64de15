// services/documents.rs - HTML document templates
//
// Documents are rendered to HTML with Handlebars and labelled as PDF. No real
// PDF rendering happens; downloads serve the stored HTML with a PDF content type.
// Templates see `data` (the request payload), `school` and `today`.

use chrono::Utc;
use handlebars::{
    Context as HbContext, Handlebars, Helper, HelperDef, Output, RenderContext, RenderError, RenderErrorReason,
};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Value};

use crate::database::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    IdCard,
    ReportCard,
    Certificate,
    AdmissionLetter,
}

impl DocumentType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "id-card" => Some(DocumentType::IdCard),
            "report-card" => Some(DocumentType::ReportCard),
            "certificate" => Some(DocumentType::Certificate),
            "admission-letter" => Some(DocumentType::AdmissionLetter),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::IdCard => "id-card",
            DocumentType::ReportCard => "report-card",
            DocumentType::Certificate => "certificate",
            DocumentType::AdmissionLetter => "admission-letter",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocument {
    pub content: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub filename: String,
}

/// Render the template for `kind` from request data and school details
pub fn generate(kind: DocumentType, data: &Value, school: Option<&Record>) -> Result<GeneratedDocument, RenderError> {
    let context = json!({
        "data": data,
        "school": school,
        "today": Utc::now().format("%Y-%m-%d").to_string(),
    });
    let content = TEMPLATES.render(kind.as_str(), &context)?;

    Ok(GeneratedDocument {
        content,
        kind: "pdf",
        filename: format!("{}-{}.pdf", kind.as_str(), Utc::now().timestamp_millis()),
    })
}

static TEMPLATES: Lazy<Handlebars<'static>> = Lazy::new(|| {
    let mut hb = Handlebars::new();
    // Missing values render as empty strings
    hb.set_strict_mode(false);
    hb.register_helper("default", Box::new(DefaultHelper));

    for (kind, source) in [
        (DocumentType::IdCard, ID_CARD),
        (DocumentType::ReportCard, REPORT_CARD),
        (DocumentType::Certificate, CERTIFICATE),
        (DocumentType::AdmissionLetter, ADMISSION_LETTER),
    ] {
        if let Err(e) = hb.register_template_string(kind.as_str(), source) {
            tracing::error!(template = kind.as_str(), "failed to compile document template: {}", e);
        }
    }
    hb
});

/// `{{default value "fallback"}}`: the fallback replaces null, missing and empty values
#[derive(Clone, Copy)]
struct DefaultHelper;

impl HelperDef for DefaultHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc HbContext,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> Result<(), RenderError> {
        let value = h.param(0).map(|p| p.value());
        let fallback = h.param(1).map(|p| p.value());

        let selected = match value {
            None | Some(Value::Null) => fallback,
            Some(Value::String(s)) if s.is_empty() => fallback,
            _ => value,
        };

        match selected {
            Some(v) => {
                let text = handlebars::JsonRender::render(v);
                out.write(&handlebars::html_escape(&text)).map_err(RenderError::from)
            }
            None => Err(RenderErrorReason::Other("default helper requires 2 params".into()).into()),
        }
    }
}

const ID_CARD: &str = r#"<div class="id-card">
  <header><h2>{{school.name}}</h2><p>Student ID Card</p></header>
  <section>
    <p><strong>Name:</strong> {{data.name}}</p>
    <p><strong>Student ID:</strong> {{data.studentId}}</p>
    <p><strong>Grade:</strong> {{data.grade}}</p>
    <p><strong>Section:</strong> {{data.section}}</p>
    <p><strong>Academic Year:</strong> 2024-2025</p>
  </section>
  <footer><p>{{school.address}} | {{school.phone}}</p></footer>
</div>"#;

const REPORT_CARD: &str = r#"<div class="report-card">
  <header><h1>{{school.name}}</h1><h2>Report Card</h2><p>Academic Year: 2024-2025 | Term: {{default data.term "First Semester"}}</p></header>
  <section>
    <p><strong>Student Name:</strong> {{data.name}}</p>
    <p><strong>Student ID:</strong> {{data.studentId}}</p>
    <p><strong>Grade:</strong> {{data.grade}}</p>
    <p><strong>Section:</strong> {{data.section}}</p>
  </section>
  <table>
    <thead><tr><th>Subject</th><th>Grade</th><th>Percentage</th><th>Remarks</th></tr></thead>
    <tbody>
      {{#each data.subjects}}<tr><td>{{name}}</td><td>{{grade}}</td><td>{{percentage}}%</td><td>{{remarks}}</td></tr>
      {{/each}}
    </tbody>
  </table>
  <section>
    <p><strong>Overall GPA:</strong> {{default data.gpa "N/A"}}</p>
    <p><strong>Attendance:</strong> {{default data.attendance "N/A"}}</p>
    <p><strong>Class Rank:</strong> {{default data.rank "N/A"}}</p>
  </section>
  <footer><p>{{school.address}} | {{school.phone}} | {{school.email}}</p></footer>
</div>"#;

const CERTIFICATE: &str = r#"<div class="certificate">
  <header><h1>{{school.name}}</h1><p>Certificate of Achievement</p></header>
  <section>
    <p>This is to certify that</p>
    <h2>{{data.name}}</h2>
    <p>has successfully completed</p>
    <h3>{{default data.achievement "Outstanding Academic Performance"}}</h3>
    <p>during the academic year 2024-2025</p>
  </section>
  <footer><p>Certificate ID: {{default data.certificateId "CERT-2024-001"}}</p></footer>
</div>"#;

const ADMISSION_LETTER: &str = r#"<div class="admission-letter">
  <header><h1>{{school.name}}</h1><p>{{school.address}}</p><p>{{school.phone}} | {{school.email}}</p></header>
  <section>
    <p><strong>Date:</strong> {{today}}</p>
    <p><strong>To:</strong> {{default data.parentName "Parent/Guardian"}}</p>
    <p><strong>Subject:</strong> Admission Confirmation - {{default data.studentName "your child"}}</p>
  </section>
  <section>
    <p>Dear {{default data.parentName "Parent/Guardian"}},</p>
    <p>We are pleased to inform you that {{default data.studentName "your child"}} has been admitted to {{school.name}} for the academic year 2024-2025.</p>
    <ul>
      <li><strong>Student ID:</strong> {{default data.studentId "STU-2024-001"}}</li>
      <li><strong>Grade:</strong> {{default data.grade "10"}}</li>
      <li><strong>Section:</strong> {{default data.section "A"}}</li>
      <li><strong>Admission Date:</strong> {{default data.admissionDate today}}</li>
      <li><strong>Classes begin:</strong> {{default data.classStartDate "August 15, 2024"}}</li>
      <li><strong>Documents due:</strong> {{default data.documentDeadline "August 10, 2024"}}</li>
      <li><strong>Orientation:</strong> {{default data.orientationDate "August 12, 2024"}}</li>
    </ul>
    <p>Best regards,<br><strong>Admissions Office</strong><br>{{school.name}}</p>
  </section>
</div>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_known_types() {
        assert_eq!(DocumentType::parse("certificate"), Some(DocumentType::Certificate));
        assert_eq!(DocumentType::parse("diploma"), None);
    }

    #[test]
    fn values_are_escaped() {
        let doc = generate(
            DocumentType::Certificate,
            &json!({ "name": "<script>alert('x')</script>", "achievement": "<b>Chess</b>" }),
            None,
        )
        .unwrap();
        assert!(!doc.content.contains("<script>"));
        assert!(doc.content.contains("&lt;script&gt;"));
        assert!(doc.content.contains("&lt;b&gt;Chess&lt;/b&gt;"));
    }

    #[test]
    fn fallbacks_fill_missing_values() {
        let doc = generate(DocumentType::AdmissionLetter, &json!({ "parentName": "" }), None).unwrap();
        assert!(doc.content.contains("Dear Parent/Guardian,"));
        assert!(doc.content.contains("<strong>Grade:</strong> 10"));

        let doc = generate(DocumentType::Certificate, &json!({}), None).unwrap();
        assert!(doc.content.contains("CERT-2024-001"));
    }

    #[test]
    fn filename_carries_type_and_extension() {
        let school = Record::new().with("name", "Riverside High School");
        let doc = generate(DocumentType::IdCard, &json!({ "name": "Emma" }), Some(&school)).unwrap();
        assert!(doc.filename.starts_with("id-card-"));
        assert!(doc.filename.ends_with(".pdf"));
        assert_eq!(doc.kind, "pdf");
        assert!(doc.content.contains("Riverside High School"));
    }

    #[test]
    fn report_card_lists_subjects() {
        let data = json!({ "name": "Emma", "subjects": [{ "name": "Algebra", "grade": "A", "percentage": 91 }] });
        let doc = generate(DocumentType::ReportCard, &data, None).unwrap();
        assert!(doc.content.contains("<td>Algebra</td><td>A</td><td>91%</td>"));
    }
}
