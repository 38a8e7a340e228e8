//! Savings model.
//!
//! totalSavings[0] = saved[0] + ethProfit[0] + bankInterest[0] + initialSavings[0]
//! totalSavings[i] = totalSavings[i-1] + saved[i] + ethProfit[i] + bankInterest[i] + initialSavings[i]
//!
//! where saved = monthlyIncome * savingFraction, bankInterest = bankDeposit *
//! bankDepositRate, ethProfit[0] = 0 and ethProfit[i] = (ethereumDollar[i] -
//! ethereumDollar[i-1]) * ETHquantity[i]. Inputs shorter than the period count
//! repeat their last value, except ETHquantity which must cover every period.

use crate::domain::error::SimError;
use crate::domain::model::{computation_error, output_len, require_series};
use crate::domain::schema::ModelKind;
use crate::domain::series_store::SeriesStore;
use crate::ports::log_port::LogPort;

const KIND: ModelKind = ModelKind::Savings;

/// Value at `i`, or the last value when the series is shorter.
fn at_or_last(values: &[f64], i: usize) -> Option<f64> {
    values.get(i).or_else(|| values.last()).copied()
}

fn input<'s>(store: &'s SeriesStore, name: &str) -> Result<&'s [f64], SimError> {
    let values = require_series(KIND, store, name, 0)?;
    if values.is_empty() {
        return Err(computation_error(KIND, format!("input '{name}' is empty")));
    }
    Ok(values)
}

pub fn run(store: &mut SeriesStore, log: &dyn LogPort) -> Result<(), SimError> {
    let periods = output_len(KIND, store)?;
    if periods == 0 {
        return Err(computation_error(
            KIND,
            "invalid number of periods (LL <= 0), calculations cannot proceed",
        ));
    }
    log.info(&format!("Savings calculation started for {periods} periods."));

    let income = input(store, "monthlyIncome")?;
    let fraction = input(store, "savingFraction")?;
    let eth_price = input(store, "ethereumDollar")?;
    let eth_quantity = require_series(KIND, store, "ETHquantity", periods)?;
    let deposit = input(store, "bankDeposit")?;
    let deposit_rate = input(store, "bankDepositRate")?;
    let initial = input(store, "initialSavings")?;

    let mut total = Vec::with_capacity(periods);
    let mut running = 0.0;
    for i in 0..periods {
        // All inputs are non-empty here, so at_or_last always yields a value.
        let at = |values: &[f64]| at_or_last(values, i).unwrap_or_default();

        let saved = at(income) * at(fraction);
        let eth_profit = if i == 0 {
            0.0
        } else {
            (at(eth_price) - at_or_last(eth_price, i - 1).unwrap_or_default()) * eth_quantity[i]
        };
        let bank_interest = at(deposit) * at(deposit_rate);

        running += saved + eth_profit + bank_interest + at(initial);
        total.push(running);

        if i == 0 || i == periods - 1 {
            log.info(&format!("Period {}: total savings = {:.2}", i + 1, running));
        }
    }

    store.set_series("totalSavings", total)?;
    log.info("Savings calculation completed.");
    Ok(())
}
