// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Named-method surface the hybrid layer calls into.
//
// Each call takes a JSON argument bag and resolves exactly once, either with
// a JSON success payload or with an `ErrorReply` carrying the platform's
// error-code spelling. The plugin owns the coordinator for one
// attach/detach cycle.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};

use paybridge_core::config::BridgeConfig;
use paybridge_core::error::{ErrorCode, ErrorReply, PayBridgeError, Result};
use paybridge_core::types::{LineItem, PaymentRequest, Platform, SessionOutcome, WalletConfig};
use paybridge_native::main_loop::MainLoop;
use paybridge_native::traits::{EventSink, MainThreadExecutor, NativeServices};

use crate::coordinator::WalletCoordinator;

// -- Argument bags ---------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeArgs {
    production_environment: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletConfigArgs {
    #[serde(alias = "company", alias = "merchantName")]
    company_name: String,
    #[serde(alias = "country")]
    country_code: String,
    #[serde(alias = "currency", default = "default_currency")]
    currency_code: String,
    production_environment: Option<bool>,
    #[serde(default)]
    billing_address_required: bool,
    #[serde(default)]
    shipping_address_required: bool,
    #[serde(default)]
    email_required: bool,
    #[serde(default)]
    phone_required: bool,
    #[serde(default)]
    name_required: bool,
}

fn default_currency() -> String {
    "USD".into()
}

impl WalletConfigArgs {
    fn into_config(self, bridge: &BridgeConfig) -> WalletConfig {
        WalletConfig {
            environment: bridge.environment_for(self.production_environment),
            merchant_name: self.company_name,
            country_code: self.country_code,
            currency_code: self.currency_code,
            billing_address_required: self.billing_address_required,
            shipping_address_required: self.shipping_address_required,
            email_required: self.email_required,
            phone_required: self.phone_required,
            name_required: self.name_required,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentArgs {
    amount: Decimal,
    #[serde(alias = "currency")]
    currency_code: String,
    #[serde(default)]
    itemization: Option<Vec<LineItem>>,
}

impl From<PaymentArgs> for PaymentRequest {
    fn from(args: PaymentArgs) -> Self {
        Self {
            amount: args.amount,
            currency_code: args.currency_code,
            itemization: args.itemization.unwrap_or_default(),
        }
    }
}

fn decode<T: DeserializeOwned>(method: &str, args: Value) -> Result<T> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| PayBridgeError::InvalidArguments {
        method: method.to_owned(),
        detail: e.to_string(),
    })
}

// -- Plugin ----------------------------------------------------------------

/// The plugin object the hybrid runtime holds between attach and detach.
pub struct WalletPlugin {
    platform: Platform,
    coordinator: Arc<WalletCoordinator>,
    /// Present when the plugin runs its own main loop.
    owned_loop: Option<Arc<MainLoop>>,
}

impl WalletPlugin {
    /// Attach with a private main loop named after `config.main_loop_name`.
    pub fn attach(
        config: BridgeConfig,
        native: NativeServices,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let main = Arc::new(MainLoop::spawn(&config.main_loop_name)?);
        let mut plugin = Self::attach_with_executor(config, native, main.clone(), events);
        plugin.owned_loop = Some(main);
        Ok(plugin)
    }

    /// Attach to a main context the host already owns.
    pub fn attach_with_executor(
        config: BridgeConfig,
        native: NativeServices,
        main: Arc<dyn MainThreadExecutor>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let platform = config.platform;
        info!(?platform, "wallet plugin attached");
        Self {
            platform,
            coordinator: Arc::new(WalletCoordinator::new(config, native, main, events)),
            owned_loop: None,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn coordinator(&self) -> &Arc<WalletCoordinator> {
        &self.coordinator
    }

    /// Dispatch one named call.
    pub async fn handle_call(
        &self,
        method: &str,
        args: Value,
    ) -> std::result::Result<Value, ErrorReply> {
        debug!(method, "plugin call");
        self.dispatch(method, args)
            .await
            .map_err(|e| ErrorReply::from_error(&e, self.platform))
    }

    async fn dispatch(&self, method: &str, args: Value) -> Result<Value> {
        let coordinator = &self.coordinator;
        if coordinator.is_detached() {
            return Err(PayBridgeError::Detached);
        }
        match method {
            "initialize" => {
                let args: InitializeArgs = decode(method, args)?;
                coordinator.initialize(args.production_environment).await?;
                Ok(Value::Null)
            }
            "initializeWallet" => {
                let args: WalletConfigArgs = decode(method, args)?;
                let config = args.into_config(coordinator.bridge_config());
                coordinator.initialize_wallet(config).await?;
                Ok(Value::Null)
            }
            "updateWalletConfiguration" => {
                let args: WalletConfigArgs = decode(method, args)?;
                let config = args.into_config(coordinator.bridge_config());
                coordinator.update_wallet_configuration(config).await?;
                Ok(Value::Null)
            }
            "isInitialized" => Ok(Value::Bool(coordinator.is_initialized())),
            "isWalletReady" => Ok(Value::Bool(coordinator.is_wallet_ready())),
            "createWalletPaymentMethod" => {
                let args: PaymentArgs = decode(method, args)?;
                let outcome = coordinator
                    .create_wallet_payment_method(args.into())
                    .await?;
                self.outcome_payload(outcome)
            }
            other => Err(PayBridgeError::NotImplemented(other.to_owned())),
        }
    }

    /// Session outcomes are success payloads; only the shape differs.
    fn outcome_payload(&self, outcome: SessionOutcome) -> Result<Value> {
        Ok(match outcome {
            SessionOutcome::Completed(method) => {
                json!({ "paymentMethod": serde_json::to_value(method)? })
            }
            SessionOutcome::Canceled => Value::Null,
            SessionOutcome::Failed(message) => {
                let error = ErrorReply {
                    code: ErrorCode::GeneralError.wire_name(self.platform).to_owned(),
                    message,
                };
                json!({ "error": error })
            }
        })
    }

    /// Tear down the coordinator and, if we own it, the main loop.
    pub fn detach(&self) {
        self.coordinator.detach();
        if let Some(main) = &self.owned_loop {
            main.shutdown();
        }
        info!("wallet plugin detached");
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use std::time::Duration;

    use paybridge_core::types::WalletEnvironment;

    use super::*;
    use crate::testing::{FakeWallet, Harness, RecordingSink};

    fn plugin_on(h: &Harness, platform: Platform) -> WalletPlugin {
        let config = BridgeConfig {
            platform,
            ..Default::default()
        };
        let services = NativeServices {
            sdk: h.wallet.clone(),
            presenters: h.wallet.clone(),
        };
        WalletPlugin::attach_with_executor(config, services, h.main.clone(), h.events.clone())
    }

    async fn ready_plugin(h: &Harness, platform: Platform) -> WalletPlugin {
        let plugin = plugin_on(h, platform);
        plugin
            .handle_call("initialize", Value::Null)
            .await
            .expect("initialize");
        plugin
            .handle_call("initializeWallet", json!({ "country": "US", "company": "Acme" }))
            .await
            .expect("initializeWallet");
        plugin
    }

    #[tokio::test]
    async fn acme_scenario_fires_ready_once() {
        let h = Harness::new();
        let plugin = ready_plugin(&h, Platform::Android).await;

        assert_eq!(
            plugin.handle_call("isWalletReady", Value::Null).await,
            Ok(json!(true))
        );
        let config = plugin.coordinator().store().config().expect("configured");
        assert_eq!(config.currency_code, "USD");
        assert_eq!(config.environment, WalletEnvironment::Test);
        h.flush().await;
        // The harness coordinator broadcast its own initial `false` too.
        assert_eq!(h.events.ready_values().iter().filter(|r| **r).count(), 1);
    }

    #[tokio::test]
    async fn precondition_codes_follow_platform() {
        let h = Harness::new();
        let android = plugin_on(&h, Platform::Android);
        let reply = android
            .handle_call("initializeWallet", json!({ "country": "US", "company": "Acme" }))
            .await
            .expect_err("not initialised");
        assert_eq!(reply.code, "SdkUninitialized");

        android
            .handle_call("initialize", json!({ "productionEnvironment": false }))
            .await
            .expect("init");
        let reply = android
            .handle_call("createWalletPaymentMethod", json!({ "amount": "1.00", "currency": "USD" }))
            .await
            .expect_err("no wallet");
        assert_eq!(reply.code, "GooglePayUninitialized");

        let ios = plugin_on(&h, Platform::Ios);
        ios.handle_call("initialize", Value::Null).await.expect("init");
        let reply = ios
            .handle_call("updateWalletConfiguration", json!({ "country": "US", "company": "Acme" }))
            .await
            .expect_err("no wallet");
        assert_eq!(reply.code, "DigitalWalletUninitialized");
    }

    #[tokio::test]
    async fn bad_setup_and_bad_arguments_are_reported() {
        let h = Harness::new();
        let plugin = ready_plugin(&h, Platform::Android).await;

        let reply = plugin
            .handle_call("updateWalletConfiguration", json!({ "country": "USA", "company": "Acme" }))
            .await
            .expect_err("bad country");
        assert_eq!(reply.code, "InvalidGooglePaySetup");

        let reply = plugin
            .handle_call("initializeWallet", json!({ "country": "US" }))
            .await
            .expect_err("missing company");
        assert_eq!(reply.code, "GeneralError");
        assert!(reply.message.contains("initializeWallet"));
    }

    #[tokio::test]
    async fn not_ready_uses_wallet_code() {
        let h = Harness::new();
        let plugin = ready_plugin(&h, Platform::Ios).await;
        h.wallet.set_can_present(false);

        let reply = plugin
            .handle_call("createWalletPaymentMethod", json!({ "amount": 10, "currency": "USD" }))
            .await
            .expect_err("incapable");
        assert_eq!(reply.code, "DigitalWalletNotReady");
    }

    #[tokio::test]
    async fn outcomes_map_to_payload_shapes() {
        let h = Harness::new();
        let plugin = ready_plugin(&h, Platform::Android).await;
        let args = json!({
            "amount": "12.50",
            "currency": "usd",
            "itemization": [{ "label": "Coffee", "amount": "12.50" }]
        });

        h.wallet.set_auto_outcome(Some(SessionOutcome::Canceled));
        assert_eq!(
            plugin.handle_call("createWalletPaymentMethod", args.clone()).await,
            Ok(Value::Null)
        );
        let request = h.wallet.presented_request(0);
        assert_eq!(request.currency_code, "USD");
        assert_eq!(request.itemization.len(), 1);
        assert_eq!(request.amount, dec!(12.50));

        h.wallet
            .set_auto_outcome(Some(SessionOutcome::Failed("card declined".into())));
        let payload = plugin
            .handle_call("createWalletPaymentMethod", args.clone())
            .await
            .expect("failure is a payload");
        assert_eq!(payload["error"]["code"], "GeneralError");
        assert_eq!(payload["error"]["message"], "card declined");

        h.wallet
            .set_auto_outcome(Some(SessionOutcome::Completed(paybridge_core::types::PaymentMethod {
                id: "pm_1".into(),
                card_brand: Some("visa".into()),
                last4: Some("4242".into()),
                billing_name: None,
                email: None,
            })));
        let payload = plugin
            .handle_call("createWalletPaymentMethod", args)
            .await
            .expect("completed");
        assert_eq!(payload["paymentMethod"]["id"], "pm_1");
        assert_eq!(payload["paymentMethod"]["cardBrand"], "visa");
    }

    #[tokio::test]
    async fn unknown_method_is_not_implemented() {
        let h = Harness::new();
        let plugin = plugin_on(&h, Platform::Android);
        let reply = plugin
            .handle_call("refundEverything", Value::Null)
            .await
            .expect_err("unknown");
        assert_eq!(reply.code, "NotImplemented");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn owned_loop_detach_resolves_pending_call() {
        let wallet = Arc::new(FakeWallet::default());
        let events = Arc::new(RecordingSink::default());
        let services = NativeServices {
            sdk: wallet.clone(),
            presenters: wallet.clone(),
        };
        let plugin = Arc::new(
            WalletPlugin::attach(BridgeConfig::default(), services, events.clone())
                .expect("attach"),
        );
        plugin.handle_call("initialize", Value::Null).await.expect("init");
        plugin
            .handle_call("initializeWallet", json!({ "country": "US", "company": "Acme" }))
            .await
            .expect("wallet");

        let pending = {
            let plugin = Arc::clone(&plugin);
            tokio::spawn(async move {
                plugin
                    .handle_call("createWalletPaymentMethod", json!({ "amount": 5, "currency": "USD" }))
                    .await
            })
        };
        wallet.wait_for_presentations(1).await;

        plugin.detach();
        let payload = tokio::time::timeout(Duration::from_secs(1), pending)
            .await
            .expect("resolved")
            .expect("join")
            .expect("failure is a payload");
        assert_eq!(payload["error"]["message"], "plugin detached");

        for method in ["isInitialized", "initialize", "isWalletReady"] {
            let reply = plugin
                .handle_call(method, Value::Null)
                .await
                .expect_err("detached");
            assert_eq!(reply.code, "GeneralError");
        }
    }
}
