//! Percentage-change and position P&L calculator.
//!
//! Pure arithmetic. Every division is guarded: a zero divisor yields 0.

use serde::{Deserialize, Serialize};

fn guarded_div(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Inputs of the positive (target price) scenario.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PositiveInputs {
    pub start: f64,
    pub end: f64,
    pub qty: i64,
    /// Hypothetical price.
    pub hyp: f64,
    /// Fraction of the position taken out.
    pub out_f: f64,
    /// Tax rate in percent.
    pub atx: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositiveOutputs {
    pub incr: f64,
    pub var_pct: f64,
    pub lqy: f64,
    pub pl: f64,
    pub out: f64,
    pub res: f64,
    pub val: f64,
    pub cst: f64,
    pub gr_inc: f64,
    pub gr_pl: f64,
    pub tx: f64,
    pub n_pl: f64,
    pub n_inc: f64,
    pub diff: f64,
}

impl PositiveOutputs {
    /// (label, value) pairs in display order.
    pub fn labeled(&self) -> [(&'static str, f64); 14] {
        [
            ("INCR", self.incr),
            ("VAR %", self.var_pct),
            ("LQY CMD", self.lqy),
            ("P/L", self.pl),
            ("OUT", self.out),
            ("RES", self.res),
            ("VAL", self.val),
            ("CST", self.cst),
            ("GR/INC", self.gr_inc),
            ("GR/P/L", self.gr_pl),
            ("TX", self.tx),
            ("N/P/L", self.n_pl),
            ("N/INC", self.n_inc),
            ("DIFF", self.diff),
        ]
    }
}

pub fn positive(inputs: &PositiveInputs) -> PositiveOutputs {
    let PositiveInputs {
        start,
        end,
        qty,
        hyp,
        out_f,
        atx,
    } = *inputs;
    let qty = qty as f64;

    let incr = end - start;
    let var_pct = guarded_div(incr, start) * 100.0;
    let lqy = start * qty;
    let pl = end * qty - lqy;
    let out = guarded_div(lqy, hyp);
    let res = qty - out;
    let val = hyp * out;
    let cst = start * out_f;
    let gr_inc = hyp * out_f;
    let gr_pl = gr_inc - cst;
    let tx = gr_pl * atx / 100.0;
    let n_pl = gr_pl - tx;
    let n_inc = gr_inc - tx;
    let diff = n_inc - lqy;

    PositiveOutputs {
        incr,
        var_pct,
        lqy,
        pl,
        out,
        res,
        val,
        cst,
        gr_inc,
        gr_pl,
        tx,
        n_pl,
        n_inc,
        diff,
    }
}

/// Inputs of the negative (loss) scenario.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NegativeInputs {
    pub start: f64,
    pub end: f64,
    pub qty: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NegativeOutputs {
    pub incr: f64,
    pub var_pct: f64,
    pub lqy: f64,
    pub n_pl: f64,
}

impl NegativeOutputs {
    pub fn labeled(&self) -> [(&'static str, f64); 4] {
        [
            ("INCR", self.incr),
            ("VAR %", self.var_pct),
            ("LQY CMD", self.lqy),
            ("N/P/L", self.n_pl),
        ]
    }
}

pub fn negative(inputs: &NegativeInputs) -> NegativeOutputs {
    let qty = inputs.qty as f64;
    let incr = inputs.end - inputs.start;
    let lqy = inputs.start * qty;
    NegativeOutputs {
        incr,
        var_pct: guarded_div(incr, inputs.start) * 100.0,
        lqy,
        n_pl: inputs.end * qty - lqy,
    }
}
