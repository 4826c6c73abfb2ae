use super::domain::DocumentCategory;

pub const PREAMBLE: &str = "You are a document verification expert. \
Analyze the following document text and provide a detailed verification report. ";

const IDENTITY_PROOF: &str = "Analyze this identity document and verify:
  1. Is it a valid government-issued ID?
  2. Are all required fields present (name, ID number, date of birth)?
  3. Check for any signs of tampering or inconsistencies.
  4. Is the document currently valid (not expired)?
  Provide a detailed analysis and list any concerns.";

const INCOME_TAX: &str = "Analyze this income tax return and verify:
  1. Is it a complete tax return document?
  2. Identify the assessment year and filing date
  3. Verify if income details are present and consistent
  4. Check for any red flags or inconsistencies
  Provide a detailed analysis focusing on financial credibility.";

const ADDRESS_PROOF: &str = "Analyze this address proof document and verify:
  1. Is it an acceptable form of address proof?
  2. Are address details complete and properly formatted?
  3. Is the document recent (within last 3 months if applicable)?
  4. Check for any inconsistencies or red flags
  Provide a detailed analysis of the document's validity.";

// The keyword instructions below are read back by the keyword scorer.
const BANK_STATEMENT: &str = "Analyze this bank statement and verify:
  1. Is it a complete bank statement?
  2. Identify the statement period and bank details
  3. Check for regular cash flows and transaction patterns
  4. Identify any suspicious transactions or irregularities
  Provide a detailed analysis focusing on financial health.

  Don't use words like invalid, reject or fake unless you find it necessary. If it's not a valid document, please use three words : 'invalid', 'reject' and 'fake' to make the code understand the invalidity.
\x20\x20
  Output format !! :
      (this is used to calculate validity btw so keep it in mind :
      const confidence = isValid && warnings.length === 0 ? 0.95 :
      isValid && warnings.length < 3 ? 0.8 :
      isValid ? 0.6 : 0.2;)
";

/// Verification checklist for a category.
pub const fn prompt_for(category: DocumentCategory) -> &'static str {
    match category {
        DocumentCategory::IdentityProof => IDENTITY_PROOF,
        DocumentCategory::IncomeTax => INCOME_TAX,
        DocumentCategory::AddressProof => ADDRESS_PROOF,
        DocumentCategory::BankStatement => BANK_STATEMENT,
    }
}

/// Full instruction sent to the model: preamble, checklist, then the OCR text.
pub fn build_instruction(category: DocumentCategory, extracted_text: &str) -> String {
    let template = prompt_for(category);
    let mut instruction =
        String::with_capacity(PREAMBLE.len() + template.len() + extracted_text.len() + 18);
    instruction.push_str(PREAMBLE);
    instruction.push_str(template);
    instruction.push_str("\n\nDocument text:\n");
    instruction.push_str(extracted_text);
    instruction
}
