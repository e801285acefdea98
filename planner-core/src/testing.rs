//! 2022 rate tables and log capture shared by unit tests.

use std::io;
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::subscriber::DefaultGuard;

use crate::{ByFilingStatus, TaxRate, TaxTable, TaxTableSet, TaxYearRates};

fn table(brackets: &[(Decimal, Decimal)]) -> TaxTable {
    TaxTable::new(
        brackets
            .iter()
            .map(|&(threshold, rate)| TaxRate::new(threshold, rate))
            .collect(),
    )
    .unwrap()
}

fn per_status(
    single: &[(Decimal, Decimal)],
    married: &[(Decimal, Decimal)],
) -> TaxTableSet {
    ByFilingStatus::new(table(single), table(married))
}

fn uniform(brackets: &[(Decimal, Decimal)]) -> TaxTableSet {
    TaxTableSet::uniform(table(brackets))
}

pub(crate) fn rates_2022() -> TaxYearRates {
    TaxYearRates {
        tax_year: 2022,
        standard_deduction: ByFilingStatus::new(dec!(12950), dec!(25900)),
        income: per_status(
            &[
                (dec!(0), dec!(0.10)),
                (dec!(10275), dec!(0.12)),
                (dec!(41775), dec!(0.22)),
                (dec!(89075), dec!(0.24)),
                (dec!(170050), dec!(0.32)),
                (dec!(215950), dec!(0.35)),
                (dec!(539900), dec!(0.37)),
            ],
            &[
                (dec!(0), dec!(0.10)),
                (dec!(20550), dec!(0.12)),
                (dec!(83550), dec!(0.22)),
                (dec!(178150), dec!(0.24)),
                (dec!(340100), dec!(0.32)),
                (dec!(431900), dec!(0.35)),
                (dec!(647850), dec!(0.37)),
            ],
        ),
        social_security: uniform(&[(dec!(0), dec!(0.062)), (dec!(147000), dec!(0))]),
        medicare: per_status(
            &[(dec!(0), dec!(0.0145)), (dec!(200000), dec!(0.0235))],
            &[(dec!(0), dec!(0.0145)), (dec!(250000), dec!(0.0235))],
        ),
        niit: uniform(&[(dec!(0), dec!(0.038))]),
        amt: per_status(
            &[
                (dec!(0), dec!(0)),
                (dec!(75900), dec!(0.26)),
                (dec!(324200), dec!(0.28)),
            ],
            &[
                (dec!(0), dec!(0)),
                (dec!(118100), dec!(0.26)),
                (dec!(324200), dec!(0.28)),
            ],
        ),
        capital_gain: per_status(
            &[
                (dec!(0), dec!(0)),
                (dec!(40401), dec!(0.15)),
                (dec!(445851), dec!(0.20)),
            ],
            &[
                (dec!(0), dec!(0)),
                (dec!(80801), dec!(0.15)),
                (dec!(501601), dec!(0.20)),
            ],
        ),
        state_income: per_status(
            &[
                (dec!(0), dec!(0.01)),
                (dec!(9325), dec!(0.02)),
                (dec!(22108), dec!(0.04)),
                (dec!(34893), dec!(0.06)),
                (dec!(48436), dec!(0.08)),
                (dec!(61215), dec!(0.093)),
                (dec!(312687), dec!(0.103)),
                (dec!(375222), dec!(0.113)),
                (dec!(625370), dec!(0.123)),
            ],
            &[
                (dec!(0), dec!(0.01)),
                (dec!(18651), dec!(0.02)),
                (dec!(44215), dec!(0.04)),
                (dec!(69785), dec!(0.06)),
                (dec!(96871), dec!(0.08)),
                (dec!(122429), dec!(0.093)),
                (dec!(625373), dec!(0.103)),
                (dec!(750443), dec!(0.113)),
                (dec!(1259739), dec!(0.123)),
            ],
        ),
        state_amt: uniform(&[(dec!(0), dec!(0.07))]),
    }
}

/// Log lines written while the guard is alive.
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Routes WARN and above on this thread into the returned buffer.
pub(crate) fn capture_warnings() -> (DefaultGuard, CapturedLogs) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    (tracing::subscriber::set_default(subscriber), logs)
}
