mod equity_event;
mod filing_status;
mod fiscal_year;
mod price_model;
mod projection_result;
mod tax_table;
mod tax_year_rates;

pub use equity_event::{EquityEvent, EquityEventInput, EquityGrant, OptionType, TransactionType};
pub use filing_status::{ByFilingStatus, FilingStatus};
pub use fiscal_year::FiscalYearFacts;
pub use price_model::{PriceModel, PricePoint};
pub use projection_result::ProjectionResult;
pub use tax_table::{TaxRate, TaxTable, TaxTableSet};
pub use tax_year_rates::{Schedule, TaxYearRates};
