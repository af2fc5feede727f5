/// Human description and six-field cron expression for "every `seconds`".
///
/// Intervals of a minute or more are rounded down to whole minutes, and the
/// description names the interval that actually fires.
pub fn build_cron_expr(seconds: u64) -> (String, String) {
    let seconds = seconds.max(1);

    let desc = if seconds < 60 {
        format!("every {} seconds", seconds)
    } else {
        format!("every {} minutes", seconds / 60)
    };

    let expr = if seconds < 60 {
        format!("*/{} * * * * *", seconds)
    } else {
        format!("0 */{} * * * *", seconds / 60)
    };

    (desc, expr)
}
