use clap::Args;
use loan_intake::config::AppConfig;
use loan_intake::error::AppError;
use loan_intake::telemetry;
use loan_intake::workflows::verification::{
    default_verifier, prompt_for, DocumentCategory, DocumentVerification, VerificationVerdict,
    PREAMBLE,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct VerifyArgs {
    /// Document category: identityProof, addressProof, incomeTax, or bankStatement
    #[arg(long)]
    pub(crate) category: DocumentCategory,
    /// PDF, PNG, or JPEG file to verify
    pub(crate) file: PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct PromptsArgs {
    /// Only print the prompt for this category
    #[arg(long)]
    pub(crate) category: Option<DocumentCategory>,
}

pub(crate) async fn run_verify(args: VerifyArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let bytes = std::fs::read(&args.file)?;
    let category = args.category;
    info!(file = %args.file.display(), %category, "verifying document");

    // The OCR tools and the HTTP client block.
    let verdict = tokio::task::spawn_blocking(move || -> Result<VerificationVerdict, AppError> {
        let verifier = default_verifier(&config.ocr, &config.model)?;
        Ok(verifier.verify(&bytes, category)?)
    })
    .await
    .map_err(std::io::Error::other)??;

    println!("{}", render_verdict(&verdict)?);
    Ok(())
}

pub(crate) fn run_prompts(args: PromptsArgs) -> Result<(), AppError> {
    let categories = match args.category {
        Some(category) => vec![category],
        None => DocumentCategory::ALL.to_vec(),
    };

    for category in categories {
        println!("== {category} ==");
        println!("{PREAMBLE}{}", prompt_for(category));
        println!();
    }
    Ok(())
}

fn render_verdict(verdict: &VerificationVerdict) -> Result<String, AppError> {
    serde_json::to_string_pretty(verdict)
        .map_err(|err| AppError::Io(std::io::Error::other(err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_renders_camel_case_json() {
        let rendered = render_verdict(&VerificationVerdict::technical_failure()).expect("json");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("parses");

        assert_eq!(value["isValid"], false);
        assert_eq!(value["confidence"], 0.1);
        assert_eq!(value["warnings"][0], "Verification process failed.");
    }

    #[test]
    fn prompts_command_prints_every_category() {
        assert!(run_prompts(PromptsArgs::default()).is_ok());
        assert!(run_prompts(PromptsArgs {
            category: Some(DocumentCategory::BankStatement),
        })
        .is_ok());
    }
}
