use legocore::{ComponentCategory, ComponentDescriptor, PropDefinition, PropType};
use legoruntime::ComponentRegistry;

/// Built-in LEGO blocks
pub fn default_components() -> Vec<ComponentDescriptor> {
    use ComponentCategory::*;

    vec![
        // auth
        ComponentDescriptor::new("diia-signature", "Diia.Signature", Auth, "Sign documents with Diia.Signature")
            .with_api("diia", "/api/v1/auth/signature")
            .with_prop("documentHash", PropDefinition::required(PropType::String, "Hash of the document to sign"))
            .with_prop("redirectUrl", PropDefinition::optional(PropType::String, "Where to return after signing"))
            .with_tags(["auth", "signature", "diia"]),
        ComponentDescriptor::new("bankid-auth", "BankID", Auth, "Authenticate with BankID")
            .with_api("bankid", "/api/v1/auth")
            .with_prop("redirectUrl", PropDefinition::required(PropType::String, "Where to return after authentication"))
            .with_tags(["auth", "bankid", "privatbank"]),
        // data
        ComponentDescriptor::new("edrfo-api", "eDrfo (Vehicles)", Data, "Vehicle records and traffic fines")
            .with_api("opendatabot", "/edrfo")
            .with_prop("licensePlate", PropDefinition::required(PropType::String, "Vehicle license plate"))
            .with_prop(
                "action",
                PropDefinition::optional(PropType::String, "One of getInfo, getFines, getOwner").with_default("getInfo"),
            )
            .with_tags(["data", "car", "edrfo", "fines"]),
        ComponentDescriptor::new("edr-api", "EDR (Companies)", Data, "Company records from the state register")
            .with_api("opendatabot", "/company")
            .with_prop("edrpou", PropDefinition::required(PropType::String, "Company EDRPOU code"))
            .with_tags(["data", "company", "edr", "edrpou"]),
        ComponentDescriptor::new("court-registry", "Court Registry", Data, "Court decisions and cases")
            .with_api("opendatabot", "/court")
            .with_prop("query", PropDefinition::required(PropType::String, "Name or case number"))
            .with_tags(["data", "court", "legal"]),
        // payment
        ComponentDescriptor::new("monobank-payment", "Monobank Payment", Payment, "Accept payments through Monobank")
            .with_api("monobank", "/api/merchant/invoice/create")
            .with_prop("amount", PropDefinition::required(PropType::Number, "Amount in kopiykas"))
            .with_prop("description", PropDefinition::required(PropType::String, "Payment purpose"))
            .with_tags(["payment", "monobank", "invoice"]),
        ComponentDescriptor::new("liqpay-payment", "LiqPay", Payment, "General purpose payment gateway")
            .with_api("liqpay", "/api/request")
            .with_prop("amount", PropDefinition::required(PropType::Number, "Payment amount"))
            .with_prop("currency", PropDefinition::optional(PropType::String, "Payment currency").with_default("UAH"))
            .with_tags(["payment", "liqpay", "gateway"]),
        // notification
        ComponentDescriptor::new("diia-push", "Diia Push", Notification, "Push notification to the Diia app")
            .with_api("diia", "/api/v1/notifications/push")
            .with_prop("userId", PropDefinition::required(PropType::String, "Diia user id"))
            .with_prop("message", PropDefinition::required(PropType::String, "Notification text"))
            .with_prop("title", PropDefinition::optional(PropType::String, "Notification title"))
            .with_tags(["notification", "push", "diia"]),
        // layout
        ComponentDescriptor::new("diia-header", "Diia Header", Layout, "Standard Diia page header")
            .with_prop("title", PropDefinition::required(PropType::String, "Page title"))
            .with_prop("showBack", PropDefinition::optional(PropType::Boolean, "Show a back button").with_default(false))
            .with_tags(["layout", "header", "ui"]),
        ComponentDescriptor::new("info-card", "Info Card", Layout, "Card with information")
            .with_prop("title", PropDefinition::required(PropType::String, "Card title"))
            .with_prop("text", PropDefinition::required(PropType::String, "Card text"))
            .with_prop("icon", PropDefinition::optional(PropType::String, "Icon"))
            .with_tags(["layout", "card", "ui"]),
        ComponentDescriptor::new("success-banner", "Success Banner", Layout, "Success message")
            .with_prop("title", PropDefinition::required(PropType::String, "Title"))
            .with_prop("message", PropDefinition::required(PropType::String, "Message"))
            .with_tags(["layout", "banner", "success", "ui"]),
        // form
        ComponentDescriptor::new("input-edrpou", "EDRPOU Input", Form, "Field for an 8-digit company code")
            .with_prop("label", PropDefinition::required(PropType::String, "Field label"))
            .with_prop("placeholder", PropDefinition::optional(PropType::String, "Placeholder text"))
            .with_tags(["form", "input", "edrpou", "company"]),
        ComponentDescriptor::new("upload-docs", "Document Upload", Form, "Upload a document to sign or attach")
            .with_prop("maxSize", PropDefinition::optional(PropType::Number, "Maximum size in bytes").with_default(10_485_760))
            .with_prop("types", PropDefinition::optional(PropType::Array, "Accepted file extensions"))
            .with_tags(["form", "upload", "document"]),
    ]
}

/// Registry pre-filled with [`default_components`].
pub fn default_component_registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    for component in default_components() {
        registry.register(component);
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use legocore::ComponentCatalog;

    #[test]
    fn catalog_covers_every_category_in_use() {
        let registry = default_component_registry();

        assert_eq!(registry.len(), 13);
        assert_eq!(registry.by_category(ComponentCategory::Payment).len(), 2);
        assert_eq!(registry.by_category(ComponentCategory::Form).len(), 2);
        assert_eq!(
            registry.get("monobank-payment").unwrap().api_provider.as_deref(),
            Some("monobank")
        );
        assert!(registry.get("diia-header").unwrap().api_provider.is_none());
        assert_eq!(registry.search("fines")[0].id, "edrfo-api");
    }
}
