pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How many indexed service/service-area groups the remote form carries.
/// Keys beyond this range are never written.
pub const SERVICE_GROUP_COUNT: usize = 12;

/// Element targets and text markers of the remote application.
///
/// The remote session implementation decides how to resolve these;
/// they are treated as opaque descriptors everywhere else.
pub mod selectors {
    pub const EMAIL_INPUT: &str = "#email";
    pub const PASSWORD_INPUT: &str = "#password";
    pub const LOGIN_BUTTON: &str = "button[type=submit]";

    pub const SEND_SECURITY_CODE_BUTTON: &str = "button:has-text('Send Security Code')";
    pub const INVALID_CODE_MARKER: &str = "text=The security code is not";
    pub const DASHBOARD_MARKER: &str = "text=Click here to switch";

    pub const NEW_CUSTOM_VALUE_BUTTON: &str = "button:has-text('New Custom Value')";
    pub const NAME_INPUT: &str = "textbox[name='Enter name']";
    pub const CREATE_BUTTON: &str = "button[name='Create']";
    pub const SEARCH_INPUT: &str = "textbox[name='Search Custom Values']";
    pub const EDIT_CUSTOM_VALUE: &str = "text=Edit Custom Value";
    pub const VALUE_INPUT: &str = "textbox[name='Enter value']";
    pub const UPDATE_BUTTON: &str = "button[name='Update']";

    /// The indexed one-digit input boxes of the security-code form
    #[must_use]
    pub fn code_digit(position: usize) -> String {
        format!("div:nth-child({}) > .m-2", position + 1)
    }

    /// Row of an existing custom value in the settings table
    #[must_use]
    pub fn custom_value_row(label: &str) -> String {
        format!("row[name='{label} {{{{']")
    }

    /// Fallback row lookup qualified by the remote category name
    #[must_use]
    pub fn categorised_custom_value_row(label: &str, category: &str) -> String {
        format!("row[name='{label} {category} {{{{']")
    }
}

/// Settings surface holding the custom values of one subaccount
#[must_use]
pub fn custom_values_url(base_url: &str, subaccount_id: &str) -> String {
    format!("{base_url}/v2/location/{subaccount_id}/settings/custom_values")
}
