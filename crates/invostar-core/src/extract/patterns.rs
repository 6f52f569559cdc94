//! Rule tables for classifying Spanish-language invoice fields.

use lazy_static::lazy_static;

use super::{RuleSet, GENERAL, NOT_SPECIFIED, OTHER};

/// Client type. Legal-entity patterns come first so that "empresa de
/// persona natural" style texts resolve to the legal entity.
pub const CLIENT_TYPE_RULES: &[(&str, &[&str])] = &[
    (
        "Persona Jurídica",
        &[
            r"persona\s+jur[ií]dica",
            r"p\.?\s*jur[ií]dica",
            r"empresa",
            r"sociedad",
            r"\bs\.a\.s",
            r"\bs\.a\.",
            r"\bltda\b",
            r"corporaci[óo]n",
        ],
    ),
    (
        "Persona Natural",
        &[r"persona\s+natural", r"p\.?\s*natural", r"individual"],
    ),
];

/// Tax regime. "No Responsable" precedes "Responsable" because the latter's
/// patterns are a suffix of the former's.
pub const TAX_REGIME_RULES: &[(&str, &[&str])] = &[
    (
        "No Responsable del IVA",
        &[
            r"no\s+responsable\s+del\s+iva",
            r"no\s+responsable\s+iva",
            r"exento\s+(?:de\s+)?iva",
        ],
    ),
    (
        "Responsable del IVA",
        &[
            r"responsable\s+del\s+impuesto\s+sobre\s+las\s+ventas",
            r"responsable\s+del\s+iva",
            r"responsable\s+iva",
        ],
    ),
    (
        "Régimen Simplificado",
        &[r"r[ée]gimen\s+simplificado", r"simplificado"],
    ),
    (
        "Gran Contribuyente",
        &[r"gran\s+contribuyente", r"\bg\.?\s*contribuyente"],
    ),
];

/// Payment categories, matched as keywords anywhere in the name. Debit is
/// checked before credit so that "tarjeta débito" is not taken for a credit
/// card.
pub const PAYMENT_CATEGORY_RULES: &[(&str, &[&str])] = &[
    ("Efectivo", &["efectivo", "cash", "contado"]),
    ("Tarjeta de Débito", &["d[ée]bito", "debit"]),
    (
        "Tarjeta de Crédito",
        &["tarjeta", "cr[ée]dito", "credit", "visa", "mastercard"],
    ),
    (
        "Transferencia",
        &["transferencia", "transfer", "bancaria", r"\bpse\b"],
    ),
    ("Cheque", &["cheque", "check"]),
    ("Consignación", &["consignaci[óo]n", "dep[óo]sito"]),
];

/// Product categories, matched as keywords anywhere in the description.
pub const PRODUCT_CATEGORY_RULES: &[(&str, &[&str])] = &[
    (
        "Servicios",
        &[
            "servicio",
            "service",
            "cuidado",
            "alojamiento",
            "consultor[ií]a",
        ],
    ),
    (
        "Productos",
        &["producto", "art[ií]culo", "item", "mercanc[ií]a"],
    ),
    (
        "Software",
        &["software", "licencia", "aplicaci[óo]n", "sistema"],
    ),
    (
        "Salud",
        &["m[ée]dic[oa]", "medicina", "salud", "hospital", "cl[ií]nica"],
    ),
    (
        "Educación",
        &[
            "educaci[óo]n",
            "curso",
            "capacitaci[óo]n",
            "entrenamiento",
        ],
    ),
    (
        "Transporte",
        &["transporte", "flete", "env[ií]o", "log[ií]stica"],
    ),
    (
        "Alimentación",
        &["alimento", "comida", "restaurante", "catering"],
    ),
];

lazy_static! {
    pub static ref CLIENT_TYPE: RuleSet =
        RuleSet::compile(CLIENT_TYPE_RULES, NOT_SPECIFIED).unwrap();

    pub static ref TAX_REGIME: RuleSet =
        RuleSet::compile(TAX_REGIME_RULES, NOT_SPECIFIED).unwrap();

    pub static ref PAYMENT_CATEGORY: RuleSet =
        RuleSet::compile(PAYMENT_CATEGORY_RULES, OTHER).unwrap();

    pub static ref PRODUCT_CATEGORY: RuleSet =
        RuleSet::compile(PRODUCT_CATEGORY_RULES, GENERAL).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tables_compile() {
        assert_eq!(CLIENT_TYPE.labels().count(), CLIENT_TYPE_RULES.len());
        assert_eq!(TAX_REGIME.labels().count(), TAX_REGIME_RULES.len());
        assert_eq!(PAYMENT_CATEGORY.labels().count(), PAYMENT_CATEGORY_RULES.len());
        assert_eq!(PRODUCT_CATEGORY.labels().count(), PRODUCT_CATEGORY_RULES.len());
    }

    #[test]
    fn test_regime_order() {
        assert_eq!(TAX_REGIME.classify("no responsable del iva"), "No Responsable del IVA");
        assert_eq!(TAX_REGIME.classify("responsable del iva"), "Responsable del IVA");
        assert_eq!(TAX_REGIME.classify("gran contribuyente"), "Gran Contribuyente");
    }
}
