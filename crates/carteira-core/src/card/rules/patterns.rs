//! Fixed patterns shared by the normalizer and disambiguator.
//!
//! Operator-specific patterns live in the registry; these are the ones that
//! hold for every card.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Whitespace runs, newlines included
    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    // Day/month/year with '/', '.' or '-' separators
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})\s?[/.\-]\s?(\d{1,2})\s?[/.\-]\s?(\d{4}|\d{2})\b"
    ).unwrap();

    // Validity month/year, e.g. "12/2025"
    pub static ref DATE_MONTH_YEAR: Regex = Regex::new(
        r"\b(0?[1-9]|1[0-2])/((?:19|20)\d{2})\b"
    ).unwrap();

    // Landline/mobile tail, e.g. "4004-2700" or "99876-5432"
    pub static ref PHONE_SHAPE: Regex = Regex::new(
        r"^(?:\(\d{2}\)\s?)?\d{4,5}-\d{4}$"
    ).unwrap();

    // CPF (individual taxpayer id), e.g. "123.456.789-09"
    pub static ref CPF_SHAPE: Regex = Regex::new(
        r"^\d{3}\.\d{3}\.\d{3}-\d{2}$"
    ).unwrap();

    // Labels of other card fields; a captured plan name ends where one begins
    pub static ref NEXT_FIELD_LABEL: Regex = Regex::new(
        r"(?i)\b(?:VALIDADE|V[ÁA]LID[OA]|VENCIMENTO|CNS|ACOMODA[ÇC][ÃA]O|NASC(?:IMENTO)?|CPF|CARTEIRINHA|CART[ÃA]O|N[ÚU]MERO|MATR[ÍI]CULA|SEGMENTA[ÇC][ÃA]O|ABRANG[ÊE]NCIA|CONTRATANTE|EMPRESA|TITULAR|BENEFICI[ÁA]RIO|NOME|REDE|CAR[ÊE]NCIA|VIG[ÊE]NCIA|C[ÓO]DIGO|ANS)\b"
    ).unwrap();
}
