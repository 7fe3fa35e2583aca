use axum::extract::Multipart;

/// An uploaded file with its data and metadata.
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Parsed form fields from the multipart analyze upload.
#[derive(Default)]
pub struct FormFields {
    /// Syllabus PDF. Mutually exclusive with `syllabus_text`.
    pub syllabus_file: Option<UploadedFile>,
    /// Syllabus pasted as plain text.
    pub syllabus_text: Option<String>,
    pub pyq_files: Vec<UploadedFile>,
    /// Sample paper used for pattern extraction.
    pub reference_file: Option<UploadedFile>,
    pub api_key: Option<String>,
    pub total_questions: Option<u32>,
}

/// Parse a multipart form upload into structured form fields.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<FormFields, String> {
    let mut fields = FormFields::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Failed to read form field: {}", e))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "syllabus_file" => {
                let filename = field.file_name().unwrap_or("syllabus.pdf").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read syllabus file: {}", e))?
                    .to_vec();
                fields.syllabus_file = Some(UploadedFile { filename, data });
            }
            "syllabus_text" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read syllabus_text: {}", e))?;
                if !val.trim().is_empty() {
                    fields.syllabus_text = Some(val);
                }
            }
            "pyq_files" => {
                let filename = field.file_name().unwrap_or("pyq.pdf").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read PYQ file: {}", e))?
                    .to_vec();
                fields.pyq_files.push(UploadedFile { filename, data });
            }
            "reference_file" => {
                let filename = field.file_name().unwrap_or("sample.pdf").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read reference file: {}", e))?
                    .to_vec();
                fields.reference_file = Some(UploadedFile { filename, data });
            }
            "api_key" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read api_key: {}", e))?;
                if !val.trim().is_empty() {
                    fields.api_key = Some(val);
                }
            }
            "total_questions" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read total_questions: {}", e))?;
                fields.total_questions = val.trim().parse().ok();
            }
            _ => {}
        }
    }

    if fields.syllabus_file.is_none() && fields.syllabus_text.is_none() {
        return Err("No syllabus provided: upload syllabus_file or paste syllabus_text".into());
    }
    if fields.pyq_files.is_empty() {
        return Err("No previous-year question papers uploaded".into());
    }

    Ok(fields)
}
