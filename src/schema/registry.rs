//! Compile-time registry of filing section schemas.
//!
//! Each known 10-K section is described by a [`SectionSchema`] whose fields
//! carry an explicit [`FieldKind`] tree. Subsection discovery walks these
//! declarations instead of relying on runtime reflection, so the set of
//! subsections a section decomposes into is known at compile time.

/// A named field inside a subsection record, with the description handed to
/// the extraction and analysis prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name.
    pub name: &'static str,
    /// What the field should capture, in prompt-ready wording.
    pub description: &'static str,
}

/// A structured record type: the shape of one subsection analysis.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    /// Type name used for labeling and validation.
    pub type_name: &'static str,
    /// Ordered fields of the record.
    pub fields: Vec<FieldSpec>,
}

/// The declared type of one section field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// A structured record; discovered as a subsection.
    Record(RecordSchema),
    /// An enumeration; never a subsection.
    Enumeration(&'static str),
    /// A plain scalar (string, number); never a subsection.
    Scalar(&'static str),
    /// An optional wrapper around an inner kind.
    Optional(Box<FieldKind>),
    /// A homogeneous list wrapper around an inner kind.
    List(Box<FieldKind>),
    /// A union of multiple kinds; structurally ambiguous and skipped with a
    /// diagnostic during discovery.
    Union(Vec<FieldKind>),
}

impl FieldKind {
    /// Shorthand for an optional wrapper.
    pub fn optional(inner: FieldKind) -> Self {
        FieldKind::Optional(Box::new(inner))
    }

    /// Shorthand for a list wrapper.
    pub fn list(inner: FieldKind) -> Self {
        FieldKind::List(Box::new(inner))
    }
}

/// A declared field of a section schema.
#[derive(Debug, Clone)]
pub struct SectionField {
    /// Field name; becomes the subsection name when the field is a record.
    pub name: &'static str,
    /// Declared kind.
    pub kind: FieldKind,
}

impl SectionField {
    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Structural schema of one filing section.
#[derive(Debug, Clone)]
pub struct SectionSchema {
    /// Canonical section name.
    pub name: &'static str,
    /// Ordered field declarations.
    pub fields: Vec<SectionField>,
}

fn record(type_name: &'static str, fields: Vec<FieldSpec>) -> FieldKind {
    FieldKind::Record(RecordSchema { type_name, fields })
}

fn spec(name: &'static str, description: &'static str) -> FieldSpec {
    FieldSpec { name, description }
}

/// Item 1. Business.
pub fn business_schema() -> SectionSchema {
    SectionSchema {
        name: "Business",
        fields: vec![
            SectionField::new(
                "business_overview",
                record(
                    "BusinessOverview",
                    vec![
                        spec("core_operations", "Primary products, services and operations"),
                        spec("business_model", "How the company generates revenue"),
                        spec("geographic_footprint", "Markets and regions served"),
                    ],
                ),
            ),
            SectionField::new(
                "competitive_landscape",
                record(
                    "CompetitiveLandscape",
                    vec![
                        spec("competitors", "Named competitors and their relative position"),
                        spec("competitive_advantages", "Moats, differentiation, market share"),
                        spec("industry_dynamics", "Industry structure and trends"),
                    ],
                ),
            ),
            SectionField::new(
                "growth_strategy",
                FieldKind::optional(record(
                    "GrowthStrategy",
                    vec![
                        spec("initiatives", "Announced growth initiatives and investments"),
                        spec("target_markets", "New markets or segments being pursued"),
                    ],
                )),
            ),
            SectionField::new(
                "human_capital",
                FieldKind::list(record(
                    "HumanCapital",
                    vec![
                        spec("workforce", "Headcount, composition and locations"),
                        spec("talent_programs", "Retention, development and culture programs"),
                    ],
                )),
            ),
            SectionField::new("filing_category", FieldKind::Enumeration("FilingCategory")),
            SectionField::new("fiscal_year_end", FieldKind::Scalar("string")),
        ],
    }
}

/// Item 1A. Risk Factors.
pub fn risk_factors_schema() -> SectionSchema {
    SectionSchema {
        name: "Risk Factors",
        fields: vec![
            SectionField::new(
                "operational_risks",
                record(
                    "OperationalRisks",
                    vec![
                        spec("supply_chain", "Supply chain and manufacturing exposure"),
                        spec("key_dependencies", "Dependence on customers, suppliers, personnel"),
                        spec("execution_risks", "Risks in executing the stated strategy"),
                    ],
                ),
            ),
            SectionField::new(
                "financial_risks",
                record(
                    "FinancialRisks",
                    vec![
                        spec("liquidity", "Liquidity, debt load and refinancing exposure"),
                        spec("currency_and_rates", "FX and interest rate exposure"),
                        spec("credit", "Counterparty and credit concentration"),
                    ],
                ),
            ),
            SectionField::new(
                "regulatory_risks",
                FieldKind::optional(record(
                    "RegulatoryRisks",
                    vec![
                        spec("pending_regulation", "Regulation that could affect operations"),
                        spec("compliance_exposure", "Ongoing compliance obligations and exposure"),
                    ],
                )),
            ),
            // Source data models this as either a structured record or a free
            // narrative depending on filer; structurally ambiguous.
            SectionField::new(
                "emerging_risks",
                FieldKind::Union(vec![
                    record(
                        "EmergingRisks",
                        vec![spec("themes", "Novel risk themes introduced this year")],
                    ),
                    FieldKind::Scalar("string"),
                ]),
            ),
            SectionField::new("risk_count", FieldKind::Scalar("number")),
        ],
    }
}

/// Item 7. Management's Discussion and Analysis.
pub fn mdna_schema() -> SectionSchema {
    SectionSchema {
        name: "Management's Discussion and Analysis",
        fields: vec![
            SectionField::new(
                "results_of_operations",
                record(
                    "ResultsOfOperations",
                    vec![
                        spec("revenue_drivers", "What drove revenue changes year over year"),
                        spec("margin_analysis", "Gross and operating margin movement and causes"),
                        spec("segment_performance", "Performance by reportable segment"),
                    ],
                ),
            ),
            SectionField::new(
                "liquidity_and_capital",
                record(
                    "LiquidityAndCapital",
                    vec![
                        spec("cash_position", "Cash, equivalents and short-term investments"),
                        spec("cash_flow", "Operating, investing and financing cash flow"),
                        spec("capital_allocation", "Dividends, buybacks, capex and debt plans"),
                    ],
                ),
            ),
            SectionField::new(
                "outlook",
                FieldKind::optional(record(
                    "ManagementOutlook",
                    vec![
                        spec("guidance", "Forward-looking statements and guidance"),
                        spec("known_trends", "Trends management expects to affect results"),
                    ],
                )),
            ),
            SectionField::new(
                "critical_estimates",
                FieldKind::list(record(
                    "CriticalEstimates",
                    vec![
                        spec("estimate_areas", "Accounting areas requiring significant judgment"),
                        spec("sensitivity", "How sensitive results are to those estimates"),
                    ],
                )),
            ),
            SectionField::new("reporting_currency", FieldKind::Scalar("string")),
        ],
    }
}

/// Item 8. Financial Statements and Supplementary Data.
pub fn financial_statements_schema() -> SectionSchema {
    SectionSchema {
        name: "Financial Statements",
        fields: vec![
            SectionField::new(
                "income_statement",
                record(
                    "IncomeStatementAnalysis",
                    vec![
                        spec("revenue", "Total revenue and growth rate"),
                        spec("profitability", "Operating and net income, margins"),
                        spec("expense_structure", "Major expense lines and their movement"),
                    ],
                ),
            ),
            SectionField::new(
                "balance_sheet",
                record(
                    "BalanceSheetAnalysis",
                    vec![
                        spec("assets", "Asset composition and notable changes"),
                        spec("liabilities", "Debt structure and maturities"),
                        spec("equity", "Equity movements, buybacks, dilution"),
                    ],
                ),
            ),
            SectionField::new(
                "cash_flow_statement",
                record(
                    "CashFlowAnalysis",
                    vec![
                        spec("operating_activities", "Cash generated by operations"),
                        spec("investing_activities", "Capex, acquisitions, divestitures"),
                        spec("financing_activities", "Debt, dividends and share activity"),
                    ],
                ),
            ),
            SectionField::new(
                "footnote_highlights",
                FieldKind::optional(record(
                    "FootnoteHighlights",
                    vec![
                        spec("significant_policies", "Accounting policy choices that matter"),
                        spec("commitments", "Commitments, contingencies and guarantees"),
                    ],
                )),
            ),
            SectionField::new("audit_opinion", FieldKind::Enumeration("AuditOpinion")),
        ],
    }
}

/// Item 3. Legal Proceedings.
pub fn legal_proceedings_schema() -> SectionSchema {
    SectionSchema {
        name: "Legal Proceedings",
        fields: vec![
            SectionField::new(
                "material_litigation",
                record(
                    "MaterialLitigation",
                    vec![
                        spec("active_matters", "Pending matters and their stage"),
                        spec("potential_exposure", "Estimated or disclosed loss exposure"),
                    ],
                ),
            ),
            SectionField::new(
                "regulatory_matters",
                FieldKind::optional(record(
                    "RegulatoryMatters",
                    vec![
                        spec("investigations", "Government investigations and inquiries"),
                        spec("settlements", "Recent settlements and consent decrees"),
                    ],
                )),
            ),
        ],
    }
}

/// Item 7A. Quantitative and Qualitative Disclosures About Market Risk.
pub fn market_risk_schema() -> SectionSchema {
    SectionSchema {
        name: "Market Risk",
        fields: vec![
            SectionField::new(
                "interest_rate_risk",
                record(
                    "InterestRateRisk",
                    vec![
                        spec("exposure", "Rate-sensitive instruments and exposure size"),
                        spec("hedging", "Hedging instruments and strategy"),
                    ],
                ),
            ),
            SectionField::new(
                "currency_risk",
                FieldKind::optional(record(
                    "CurrencyRisk",
                    vec![
                        spec("exposure", "Foreign-currency revenue and cost exposure"),
                        spec("hedging", "FX hedging program"),
                    ],
                )),
            ),
            SectionField::new("uses_derivatives", FieldKind::Scalar("bool")),
        ],
    }
}

/// The record used for whole-section analysis when a section declares no
/// subsections or its name is not in the registry.
pub fn generic_section_record() -> RecordSchema {
    RecordSchema {
        type_name: "GenericSectionAnalysis",
        fields: vec![
            spec("summary", "Concise summary of the section"),
            spec("key_points", "The most important points, one per line"),
            spec("notable_items", "Anything unusual, material, or time-sensitive"),
        ],
    }
}

/// Resolves a filing section title to its registered schema.
///
/// Matching is case-insensitive and tolerant of item-number prefixes
/// ("Item 1A. Risk Factors" resolves the same as "Risk Factors").
/// Unrecognized names return `None`; the orchestrator then skips subsection
/// decomposition and runs a single generic whole-section analysis.
pub fn schema_for_section(section_name: &str) -> Option<SectionSchema> {
    let normalized = section_name.to_lowercase();

    // "market risk" must be tested before the generic "risk" titles.
    if normalized.contains("market risk") {
        Some(market_risk_schema())
    } else if normalized.contains("risk factor") {
        Some(risk_factors_schema())
    } else if normalized.contains("management's discussion")
        || normalized.contains("managements discussion")
        || normalized.contains("md&a")
    {
        Some(mdna_schema())
    } else if normalized.contains("financial statement") {
        Some(financial_statements_schema())
    } else if normalized.contains("legal proceeding") {
        Some(legal_proceedings_schema())
    } else if normalized.contains("business") {
        Some(business_schema())
    } else {
        None
    }
}
