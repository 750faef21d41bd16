//! Payment gateway redirect URLs
//!
//! Pure string templating: no provider SDK, no network. The hosted pages
//! take the order reference, the amount and where to land afterwards; the
//! provider answers through the callback endpoint.

use rust_decimal::Decimal;

use shared::models::PaymentMethod;

const JAZZCASH_BASE: &str =
    "https://sandbox.jazzcash.com.pk/ApplicationAPI/API/2.0/Purchase/DoMWalletTransaction";
const EASYPAISA_BASE: &str = "https://easypay.easypaisa.com.pk/easypay/Index.jsf";
const CARD_PAGE: &str = "/payment/card";

/// Build the provider redirect URL for a prepaid method.
///
/// Amounts are templated with exactly two decimal places. Cash on delivery
/// has no gateway and yields `None`.
pub fn payment_url(
    method: &PaymentMethod,
    order_id: i64,
    amount: Decimal,
    return_url: &str,
) -> Option<String> {
    let mut amount = amount;
    amount.rescale(2);

    match method {
        PaymentMethod::Jazzcash => Some(format!(
            "{JAZZCASH_BASE}?orderId={order_id}&amount={amount}&returnUrl={return_url}"
        )),
        PaymentMethod::Easypaisa => Some(format!(
            "{EASYPAISA_BASE}?orderRefNum={order_id}&amount={amount}&postBackURL={return_url}"
        )),
        PaymentMethod::Card => Some(format!("{CARD_PAGE}?orderId={order_id}&amount={amount}")),
        PaymentMethod::Cod => None,
    }
}
