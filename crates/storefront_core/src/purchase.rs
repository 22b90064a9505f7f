use shared::domain::Product;
use url::form_urlencoded;

pub const DEFAULT_SALES_PHONE: &str = "5551995619576";
const WHATSAPP_BASE: &str = "https://wa.me/";

/// Builds the WhatsApp hand-off links the storefront opens in a new tab.
#[derive(Debug, Clone)]
pub struct PurchaseLinks {
    phone: String,
}

impl Default for PurchaseLinks {
    fn default() -> Self {
        Self::new(DEFAULT_SALES_PHONE)
    }
}

impl PurchaseLinks {
    /// Non-digits are stripped so `+55 (51) 99561-9576` works as well.
    pub fn new(phone: &str) -> Self {
        Self {
            phone: phone.chars().filter(char::is_ascii_digit).collect(),
        }
    }

    pub fn contact_link(&self) -> String {
        format!("{WHATSAPP_BASE}{}", self.phone)
    }

    pub fn purchase_link(&self, product: &Product) -> String {
        let message = interest_message(&product.name);
        let text: String = form_urlencoded::byte_serialize(message.as_bytes()).collect();
        format!("{}?text={text}", self.contact_link())
    }
}

pub fn interest_message(product_name: &str) -> String {
    format!("Olá, tenho interesse no produto: {product_name}")
}
