//! The built-in four-stage financial document analysis.

use super::config::{PipelineConfig, Stage};

pub const VERIFICATION: &str = "verification";
pub const FINANCIAL_ANALYSIS: &str = "financial_analysis";
pub const RISK_ASSESSMENT: &str = "risk_assessment";
pub const INVESTMENT_RECOMMENDATION: &str = "investment_recommendation";

const ADVISOR_GOAL: &str = "Provide a structured investment report using ONLY verified financial data.

Format strictly as:

Final Recommendation: BUY / HOLD / SELL

Company Overview:
- Brief summary

Key Financial Metrics:
- Revenue
- Net Income
- EPS
- Growth %

Revenue & Profit Trends:
- Trend explanation

Cash Flow & Balance Sheet Observations:
- Liquidity
- Debt levels

Notable Insights:
- 3-5 bullet insights

Do NOT include thoughts or meta commentary.
Output only the final structured report.";

/// verify -> analyze -> risk -> recommend.
///
/// The analysis reads the verification verdict, risk reads the analysis, and
/// the recommendation sees both the analysis and the risk report, in that order.
pub fn financial_pipeline() -> PipelineConfig {
    PipelineConfig::new(vec![
        Stage::new(
            VERIFICATION,
            "Here is the financial document content:\n\n\
             {document_text}\n\n\
             Determine whether this is a valid financial document \
             (earnings report, annual report, financial statement, investor presentation).\n\n\
             If NOT financial, clearly reject it with reason.\n\
             If valid, justify using financial terminology and structure.",
        )
        .with_persona(
            "Financial Document Verification Specialist",
            "Verify whether the uploaded file is a valid financial document such as an \
             earnings report, financial statement, or investor presentation.",
            "You are a compliance-focused financial auditor experienced in reviewing corporate \
             disclosures. You identify financial documents based on structured financial data, \
             accounting terminology, and numeric reporting.",
        )
        .with_expected_output(
            "VALID FINANCIAL DOCUMENT or NOT A FINANCIAL DOCUMENT\n\
             Followed by 2-4 bullet points of justification.",
        ),
        Stage::new(
            FINANCIAL_ANALYSIS,
            "Based strictly on the following financial document content:\n\n\
             {document_text}\n\n\
             User Query: {query}\n\n\
             Provide a structured financial report including:\n\
             1. Company Overview\n\
             2. Key Financial Metrics\n\
             3. Revenue & Profit Trends\n\
             4. Cash Flow & Balance Sheet Observations\n\
             5. Notable Insights\n\n\
             Use ONLY information explicitly available in the document.",
        )
        .with_persona(
            "Senior Financial Analyst",
            "Analyze the uploaded financial document and provide structured, data-driven \
             financial insights based strictly on the document content. User Query: {query}",
            "You are a CFA-level financial analyst with deep expertise in financial statements, \
             valuation, profitability analysis, and macroeconomic interpretation. You base \
             conclusions strictly on documented financial metrics and never fabricate data.",
        )
        .with_expected_output(
            "A structured financial report with clear section headers and bullet points.",
        )
        .depends_on([VERIFICATION]),
        Stage::new(
            RISK_ASSESSMENT,
            "Using the financial analysis as context, assess:\n\
             - Liquidity Risk\n\
             - Leverage Risk\n\
             - Earnings Volatility\n\
             - Macroeconomic Exposure\n\
             - Operational Risks\n\n\
             Base conclusions strictly on documented financial metrics.",
        )
        .with_persona(
            "Corporate Risk Analyst",
            "Assess financial risks including liquidity, leverage, earnings volatility, \
             macroeconomic exposure, and operational risks based strictly on the document.",
            "You are a professional risk analyst specializing in financial stability assessment. \
             You evaluate debt levels, margins, cash flows, and volatility indicators without \
             speculation.",
        )
        .with_expected_output(
            "Structured risk report with clear headings and concise explanations.",
        )
        .depends_on([FINANCIAL_ANALYSIS]),
        Stage::new(
            INVESTMENT_RECOMMENDATION,
            "Based on financial analysis and risk assessment, provide final recommendation:\n\
             - BUY, HOLD, or SELL\n\n\
             Justify using financial metrics and risk considerations.",
        )
        .with_persona(
            "Investment Strategy Advisor",
            ADVISOR_GOAL,
            "You are a SEBI-compliant investment advisor with experience in portfolio strategy \
             and equity research. You provide responsible recommendations backed by financial \
             metrics and risk evaluation.",
        )
        .with_expected_output(
            "Final Recommendation: BUY / HOLD / SELL\n\
             Followed by concise justification.",
        )
        .depends_on([FINANCIAL_ANALYSIS, RISK_ASSESSMENT]),
    ])
}
