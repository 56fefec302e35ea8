//! Clinical code sets for CKD and renal labs.
//!
//! SNOMED condition codes (one per CKD stage) and LOINC lab codes used by the
//! aggregation engine and the registration builders. These are fixed value
//! sets; the gateway performs no terminology lookups.

use crate::types::Coding;

pub const SNOMED_SYSTEM: &str = "http://snomed.info/sct";
pub const LOINC_SYSTEM: &str = "http://loinc.org";
pub const UCUM_SYSTEM: &str = "http://unitsofmeasure.org";

pub const CONDITION_CLINICAL_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-clinical";
pub const CONDITION_VER_STATUS_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-ver-status";
pub const CONDITION_CATEGORY_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-category";
pub const OBSERVATION_CATEGORY_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/observation-category";

/// SNOMED codes for the five CKD stages, in stage order.
///
/// Stage 3 intentionally carries the "stage 3B" concept; 3A/3B granularity
/// exists only in the eGFR-derived summary, not at registration.
pub const CKD_STAGE_CODES: [(&str, &str, &str); 5] = [
    ("1", "431855005", "Chronic kidney disease stage 1"),
    ("2", "431856006", "Chronic kidney disease stage 2"),
    ("3", "700379002", "Chronic kidney disease stage 3B"),
    ("4", "431857002", "Chronic kidney disease stage 4"),
    ("5", "431858007", "Chronic kidney disease stage 5"),
];

/// LOINC code for estimated glomerular filtration rate.
pub const EGFR_CODE: &str = "48642-3";
/// LOINC code for serum creatinine.
pub const CREATININE_CODE: &str = "33914-3";
/// LOINC code for blood urea nitrogen.
pub const BUN_CODE: &str = "14682-9";

/// The renal lab codes considered by the CKD summary, eGFR first.
pub const CKD_LAB_CODES: [&str; 3] = [EGFR_CODE, CREATININE_CODE, BUN_CODE];

/// True when `code` names one of the five CKD condition codes.
pub fn is_ckd_condition_code(code: &str) -> bool {
    CKD_STAGE_CODES.iter().any(|(_, c, _)| *c == code)
}

/// True when `code` names one of the renal lab codes.
pub fn is_ckd_lab_code(code: &str) -> bool {
    CKD_LAB_CODES.contains(&code)
}

/// The SNOMED coding for a declared CKD stage.
///
/// An unrecognised stage falls back to stage 3, the registration default.
pub fn ckd_stage_coding(stage: &str) -> Coding {
    let (_, code, display) = CKD_STAGE_CODES
        .iter()
        .find(|(s, _, _)| *s == stage)
        .unwrap_or(&CKD_STAGE_CODES[2]);
    Coding::new(SNOMED_SYSTEM, code, display)
}

/// The LOINC coding for a lab type (`"egfr"`, `"creatinine"` or `"bun"`).
pub fn lab_coding(lab_type: &str) -> Option<Coding> {
    match lab_type {
        "egfr" => Some(Coding::new(
            LOINC_SYSTEM,
            EGFR_CODE,
            "Glomerular filtration rate/1.73 sq M.predicted [Volume Rate/Area] \
             in Serum or Plasma by Creatinine-based formula (CKD-EPI)",
        )),
        "creatinine" => Some(Coding::new(
            LOINC_SYSTEM,
            CREATININE_CODE,
            "Creatinine [Mass/volume] in Serum or Plasma",
        )),
        "bun" => Some(Coding::new(
            LOINC_SYSTEM,
            BUN_CODE,
            "Creatinine [Moles/volume] in Serum or Plasma",
        )),
        _ => None,
    }
}
