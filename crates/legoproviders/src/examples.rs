//! Ready-made flows for the standard components and providers.
//!
//! Used as `lego init` templates and as end-to-end fixtures.

use chrono::Utc;
use legocore::{ApiBinding, FlowBuilder, FlowDefinition, FlowMetadata, HttpMethod, Position};
use serde_json::{json, Map, Value};

/// Template names accepted by [`example_flow`], in catalog order.
pub const TEMPLATE_NAMES: [&str; 3] = ["traffic-fine", "company-verification", "document-signing"];

/// Look up an example flow by template name.
pub fn example_flow(name: &str) -> Option<FlowDefinition> {
    match name {
        "traffic-fine" => Some(traffic_fine_flow()),
        "company-verification" => Some(company_verification_flow()),
        "document-signing" => Some(document_signing_flow()),
        _ => None,
    }
}

pub fn all_example_flows() -> Vec<FlowDefinition> {
    vec![
        traffic_fine_flow(),
        company_verification_flow(),
        document_signing_flow(),
    ]
}

/// Sign in with Diia, fetch traffic fines, issue a Monobank invoice, confirm.
pub fn traffic_fine_flow() -> FlowDefinition {
    let mut builder = FlowBuilder::new("Traffic Fine Payment")
        .with_id("flow_traffic_fine")
        .description("Оплата штрафів за порушення ПДР");

    let auth = builder.add_step(
        "diia-signature",
        config(json!({"title": "Увійдіть через Дія", "documentHash": "traffic_fine_auth"})),
        at(100.0),
        Some(
            ApiBinding::new("diia", "/api/v1/auth/signature")
                .with_method(HttpMethod::Post)
                .map_response("userId", "user.id")
                .map_response("userName", "user.name"),
        ),
    );
    let fines = builder.add_step(
        "edrfo-api",
        config(json!({"action": "getFines"})),
        at(250.0),
        Some(
            ApiBinding::new("opendatabot", "/edrfo/fines")
                .with_param("userId", "{{step_1.userId}}")
                .map_response("fines", "data.fines")
                .map_response("totalAmount", "data.total"),
        ),
    );
    let payment = builder.add_step(
        "monobank-payment",
        config(json!({"description": "Оплата штрафу ПДР"})),
        at(400.0),
        Some(
            ApiBinding::new("monobank", "/api/merchant/invoice/create")
                .with_method(HttpMethod::Post)
                .with_body_field("amount", "{{step_2.totalAmount}}")
                .with_body_field("description", "Оплата штрафу ПДР")
                .map_response("invoiceId", "invoiceId")
                .map_response("paymentUrl", "pageUrl"),
        ),
    );
    let success = builder.add_step(
        "success-banner",
        config(json!({
            "title": "Штраф оплачено!",
            "message": "Дякуємо за оплату. Квитанція надіслана на ваш email."
        })),
        at(550.0),
        None,
    );

    builder.connect(&auth, &fines, None);
    builder.connect(&fines, &payment, None);
    builder.connect(&payment, &success, None);
    builder.set_metadata(metadata(["traffic", "fine", "payment"]));
    builder.build()
}

/// EDRPOU input, company record, court cases, summary card.
pub fn company_verification_flow() -> FlowDefinition {
    let mut builder = FlowBuilder::new("Company Verification")
        .with_id("flow_company_verification")
        .description("Перевірка компанії за кодом ЄДРПОУ");

    let input = builder.add_step(
        "input-edrpou",
        config(json!({"label": "Введіть код ЄДРПОУ", "placeholder": "12345678"})),
        at(100.0),
        None,
    );
    let company = builder.add_step(
        "edr-api",
        Map::new(),
        at(250.0),
        Some(
            ApiBinding::new("opendatabot", "/company")
                .with_param("code", "{{step_1.edrpou}}")
                .map_response("name", "data.name")
                .map_response("director", "data.head")
                .map_response("address", "data.address")
                .map_response("status", "data.state"),
        ),
    );
    let court = builder.add_step(
        "court-registry",
        Map::new(),
        at(400.0),
        Some(
            ApiBinding::new("opendatabot", "/court")
                .with_param("query", "{{step_2.name}}")
                .map_response("cases", "data.cases")
                .map_response("caseCount", "data.count"),
        ),
    );
    let card = builder.add_step(
        "info-card",
        config(json!({
            "title": "{{step_2.name}}",
            "text": "Директор: {{step_2.director}}\nАдреса: {{step_2.address}}\nСудових справ: {{step_3.caseCount}}",
            "icon": "🏢"
        })),
        at(550.0),
        None,
    );

    builder.connect(&input, &company, None);
    builder.connect(&company, &court, None);
    builder.connect(&court, &card, None);
    builder.set_metadata(metadata(["company", "verification", "edr"]));
    builder.build()
}

/// Upload, sign with Diia.Signature, push a notification, confirm.
pub fn document_signing_flow() -> FlowDefinition {
    let mut builder = FlowBuilder::new("Document Signing")
        .with_id("flow_document_signing")
        .description("Підпис документа через Дія.Підпис");

    let upload = builder.add_step(
        "upload-docs",
        // 10 MB
        config(json!({"maxSize": 10_485_760, "types": ["pdf", "jpg", "png"]})),
        at(100.0),
        None,
    );
    let sign = builder.add_step(
        "diia-signature",
        config(json!({"title": "Підпишіть документ"})),
        at(250.0),
        Some(
            ApiBinding::new("diia", "/api/v1/auth/signature")
                .with_method(HttpMethod::Post)
                .with_body_field("documentHash", "{{step_1.fileHash}}")
                .map_response("signedDocument", "data.signedDocument")
                .map_response("userId", "data.userId"),
        ),
    );
    let notify = builder.add_step(
        "diia-push",
        config(json!({"title": "Документ підписано", "message": "Ваш документ успішно підписано"})),
        at(400.0),
        Some(
            ApiBinding::new("diia", "/api/v1/notifications/push")
                .with_method(HttpMethod::Post)
                .with_body_field("userId", "{{step_2.userId}}")
                .with_body_field("title", "Документ підписано")
                .with_body_field("message", "Ваш документ успішно підписано"),
        ),
    );
    let success = builder.add_step(
        "success-banner",
        config(json!({"title": "Готово!", "message": "Документ підписано та збережено"})),
        at(550.0),
        None,
    );

    builder.connect(&upload, &sign, None);
    builder.connect(&sign, &notify, None);
    builder.connect(&notify, &success, None);
    builder.set_metadata(metadata(["document", "signature", "diia"]));
    builder.build()
}

fn config(values: Value) -> Map<String, Value> {
    match values {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Steps are laid out in a single column.
fn at(y: f32) -> Option<Position> {
    Some(Position { x: 100.0, y })
}

fn metadata<const N: usize>(tags: [&str; N]) -> FlowMetadata {
    FlowMetadata {
        author: Some("Yana.Diia".to_string()),
        version: Some("1.0.0".to_string()),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        created_at: Some(Utc::now()),
        updated_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{default_component_registry, default_provider_registry};
    use legoruntime::validate_flow;

    #[test]
    fn every_example_passes_validation() {
        let components = default_component_registry();
        let providers = default_provider_registry().unwrap();

        for flow in all_example_flows() {
            let order = validate_flow(&flow, &components, &providers)
                .unwrap_or_else(|e| panic!("{} is invalid: {}", flow.id, e));
            assert_eq!(order, vec!["step_1", "step_2", "step_3", "step_4"], "{}", flow.id);

            let metadata = flow.metadata.as_ref().unwrap();
            assert_eq!(metadata.author.as_deref(), Some("Yana.Diia"));
            assert_eq!(metadata.tags.len(), 3);
            assert!(flow.steps.iter().all(|step| step.position.is_some()));
        }
    }

    #[test]
    fn templates_resolve_by_name() {
        for name in TEMPLATE_NAMES {
            assert!(example_flow(name).is_some(), "missing template {}", name);
        }
        assert_eq!(example_flow("company-verification").unwrap().name, "Company Verification");
        assert!(example_flow("tax-return").is_none());
    }

    #[test]
    fn traffic_fine_payment_uses_fine_total() {
        let flow = traffic_fine_flow();
        let payment = flow.find_step("step_3").unwrap();
        let binding = payment.api_binding.as_ref().unwrap();

        assert_eq!(binding.provider, "monobank");
        assert_eq!(binding.method, HttpMethod::Post);
        assert_eq!(
            binding.body,
            Some(json!({"amount": "{{step_2.totalAmount}}", "description": "Оплата штрафу ПДР"}))
        );
        let targets: Vec<_> = binding.response_mapping.as_ref().unwrap().keys().collect();
        assert_eq!(targets, ["invoiceId", "paymentUrl"]);
    }
}
