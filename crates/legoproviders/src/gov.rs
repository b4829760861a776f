//! Providers for the government and banking backends used by citizen services.

use crate::config::ProviderConfig;
use crate::http::HttpProvider;
use async_trait::async_trait;
use legocore::{ApiError, ApiProvider, ApiResponse, RequestOptions};
use serde_json::json;

/// A named provider wrapping [`HttpProvider`] with its preset configuration.
/// The [`ApiProvider`] impl delegates everything to the inner client.
macro_rules! http_backed_provider {
    ($(#[$doc:meta])* $provider:ident => $preset:path) => {
        $(#[$doc])*
        pub struct $provider {
            http: HttpProvider,
        }

        impl $provider {
            pub fn new() -> Result<Self, reqwest::Error> {
                Self::with_config($preset())
            }

            pub fn with_config(config: ProviderConfig) -> Result<Self, reqwest::Error> {
                Ok(Self {
                    http: HttpProvider::new(config)?,
                })
            }
        }

        #[async_trait]
        impl ApiProvider for $provider {
            fn name(&self) -> &str {
                self.http.name()
            }

            fn base_url(&self) -> &str {
                self.http.base_url()
            }

            async fn authenticate(&self) -> Result<(), ApiError> {
                self.http.authenticate().await
            }

            async fn request(&self, endpoint: &str, options: RequestOptions) -> ApiResponse {
                self.http.request(endpoint, options).await
            }

            fn clear_cache(&self) {
                self.http.clear_cache()
            }
        }
    };
}

http_backed_provider! {
    /// Diia: documents, digital signature and identity verification
    DiiaProvider => ProviderConfig::diia
}

http_backed_provider! {
    /// OpenDataBot: company, vehicle and court registries
    OpenDataBotProvider => ProviderConfig::opendatabot
}

http_backed_provider! {
    /// Monobank acquiring: invoices and their status
    MonobankProvider => ProviderConfig::monobank
}

impl DiiaProvider {
    pub async fn documents(&self, user_id: &str) -> ApiResponse {
        self.request("/api/v1/documents", RequestOptions::get().with_param("userId", user_id))
            .await
    }

    pub async fn sign_document(&self, document_hash: &str) -> ApiResponse {
        self.request(
            "/api/v1/auth/signature",
            RequestOptions::post(json!({ "documentHash": document_hash })),
        )
        .await
    }

    pub async fn verify_identity(&self, token: &str) -> ApiResponse {
        self.request("/api/v1/verify", RequestOptions::get().with_param("token", token))
            .await
    }
}

impl OpenDataBotProvider {
    /// Look up a company by its EDRPOU code.
    pub async fn search_company(&self, edrpou: &str) -> ApiResponse {
        self.request("/company", RequestOptions::get().with_param("code", edrpou))
            .await
    }

    pub async fn car_info(&self, license_plate: &str) -> ApiResponse {
        self.request("/edrfo", RequestOptions::get().with_param("number", license_plate))
            .await
    }

    pub async fn court_cases(&self, query: &str) -> ApiResponse {
        self.request("/court", RequestOptions::get().with_param("q", query))
            .await
    }
}

impl MonobankProvider {
    /// Amount is in kopiykas.
    pub async fn create_invoice(&self, amount: u64, description: &str) -> ApiResponse {
        self.request(
            "/api/merchant/invoice/create",
            RequestOptions::post(json!({ "amount": amount, "description": description })),
        )
        .await
    }

    pub async fn invoice_status(&self, invoice_id: &str) -> ApiResponse {
        self.request(
            "/api/merchant/invoice/status",
            RequestOptions::get().with_param("invoiceId", invoice_id),
        )
        .await
    }
}
