//! ADX with +DI / −DI (Wilder).
//!
//! +DM = H[i]-H[i-1] when it exceeds L[i-1]-L[i] and is positive, else 0;
//! −DM mirrored. TR, +DM and −DM are Wilder-smoothed from bar 1, giving
//! DI = 100 * DM / TR from bar n. DX = 100 * |+DI − −DI| / (+DI + −DI) and
//! ADX is the Wilder average of DX, first defined at bar 2n − 1.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::indicator_helpers::{safe_div, true_ranges, wilder_smooth};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_adx(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let n = bars.len();
    let tr = true_ranges(bars);
    let mut plus_dm = vec![0.0; n];
    let mut minus_dm = vec![0.0; n];
    for i in 1..n {
        let up = bars[i].high - bars[i - 1].high;
        let down = bars[i - 1].low - bars[i].low;
        if up > down && up > 0.0 {
            plus_dm[i] = up;
        }
        if down > up && down > 0.0 {
            minus_dm[i] = down;
        }
    }

    let tr_s = wilder_smooth(&tr, period, 1);
    let plus_s = wilder_smooth(&plus_dm, period, 1);
    let minus_s = wilder_smooth(&minus_dm, period, 1);

    let mut plus_di = vec![None; n];
    let mut minus_di = vec![None; n];
    let mut dx = vec![0.0; n];
    for i in 0..n {
        if let (Some(t), Some(p), Some(m)) = (tr_s[i], plus_s[i], minus_s[i]) {
            let pdi = safe_div(p, t, 0.0) * 100.0;
            let mdi = safe_div(m, t, 0.0) * 100.0;
            plus_di[i] = Some(pdi);
            minus_di[i] = Some(mdi);
            dx[i] = safe_div((pdi - mdi).abs(), pdi + mdi, 0.0) * 100.0;
        }
    }

    let adx = wilder_smooth(&dx, period, period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let valid = adx[i].is_some() && plus_di[i].is_some();
            IndicatorPoint {
                timestamp: bar.timestamp,
                valid,
                value: IndicatorValue::Directional {
                    adx: adx[i].unwrap_or(0.0),
                    plus_di: plus_di[i].unwrap_or(0.0),
                    minus_di: minus_di[i].unwrap_or(0.0),
                },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Adx(period),
        values,
    }
}

/// ADX reading at `index` if valid.
pub fn adx_at(series: &IndicatorSeries, index: usize) -> Option<f64> {
    match series.valid_at(index) {
        Some(IndicatorValue::Directional { adx, .. }) => Some(*adx),
        _ => None,
    }
}
