use std::time::Duration;

use base64::prelude::*;
use bitcoin::{Address, Amount, FeeRate, Transaction, Txid, consensus::encode};
use reqwest::{Client as HttpClient, ClientBuilder, header::HeaderMap};
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::operations::Utxo;

use super::{
    error::{BitcoinRpcErrorResponse, Error},
    types::{EstimateSmartFeeResult, Request, Response, UnspentOutput},
};

#[derive(Clone, Debug)]
pub struct Client {
    client: HttpClient,
    url: String,
    conf_target: u16,
}

const JSONRPC: &str = "2.0";
const MAX_CONFIRMATIONS: u32 = 9_999_999;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Converts a node fee estimate in BTC/kvB to a `FeeRate`, rounding up so the
/// resulting fee never undershoots the estimate. 1 kvB is 4 kWU.
pub fn fee_rate_from_btc_per_kvb(btc_per_kvb: f64) -> Result<FeeRate, Error> {
    let sat_per_kvb = Amount::from_btc(btc_per_kvb)?.to_sat();
    Ok(FeeRate::from_sat_per_kwu(sat_per_kvb.div_ceil(4)))
}

pub fn fee_rate_from_estimate(result: EstimateSmartFeeResult) -> Result<FeeRate, Error> {
    let btc_per_kvb = result
        .feerate
        .ok_or_else(|| Error::NoFeeEstimate(result.errors.unwrap_or_default().join(", ")))?;
    fee_rate_from_btc_per_kvb(btc_per_kvb)
}

impl Client {
    pub fn new(
        url: String,
        user: String,
        password: String,
        conf_target: u16,
    ) -> Result<Self, Error> {
        let client = ClientBuilder::new()
            .default_headers({
                let mut headers = HeaderMap::new();
                let auth_str = BASE64_STANDARD.encode(format!("{}:{}", user, password));
                headers.insert("Authorization", format!("Basic {}", auth_str).parse()?);
                headers.insert("Content-Type", "application/json".parse()?);
                headers.insert("Accept", "application/json".parse()?);
                headers
            })
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Client {
            client,
            url,
            conf_target,
        })
    }

    pub fn new_from_config(config: &Config) -> Result<Self, Error> {
        Client::new(
            config.bitcoin_rpc_url.to_owned(),
            config.bitcoin_rpc_user.to_owned(),
            config.bitcoin_rpc_password.to_owned(),
            config.conf_target,
        )
    }

    pub fn handle_response<T>(response: Response) -> Result<T, Error>
    where
        T: for<'de> Deserialize<'de>,
    {
        match (response.result, response.error) {
            (Some(result), None) => Ok(serde_json::from_value(result)?),
            (None, Some(error)) => {
                let detail: BitcoinRpcErrorResponse = serde_json::from_value(error)?;
                Err(Error::BitcoinRpc {
                    code: detail.code,
                    message: detail.message,
                })
            }
            (None, None) => Err(Error::Unexpected(
                "No result or error in RPC response".to_string(),
            )),
            (Some(_), Some(_)) => Err(Error::Unexpected(
                "Both result and error present in RPC response".to_string(),
            )),
        }
    }

    pub async fn call<T>(&self, method: &str, params: Vec<Value>) -> Result<T, Error>
    where
        T: for<'de> Deserialize<'de>,
    {
        let request = Request {
            jsonrpc: JSONRPC.to_owned(),
            id: "0".to_string(),
            method: method.to_string(),
            params,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .json::<Response>()
            .await?;

        Self::handle_response(response)
    }

    pub async fn list_unspent(
        &self,
        min_conf: u32,
        max_conf: u32,
        addresses: &[String],
    ) -> Result<Vec<UnspentOutput>, Error> {
        let params = vec![min_conf.into(), max_conf.into(), addresses.into()];
        self.call("listunspent", params).await
    }

    pub async fn estimate_smart_fee(&self, conf_target: u16) -> Result<FeeRate, Error> {
        let result: EstimateSmartFeeResult = self
            .call("estimatesmartfee", vec![conf_target.into()])
            .await?;
        fee_rate_from_estimate(result)
    }

    pub async fn send_raw_transaction(&self, tx: &Transaction) -> Result<Txid, Error> {
        self.call("sendrawtransaction", vec![encode::serialize_hex(tx).into()])
            .await
    }
}

/// Where UTXOs and fee rates come from, and where finished transactions go.
pub trait UtxoSource: Send + Sync {
    fn get_utxos(
        &self,
        address: &Address,
    ) -> impl Future<Output = Result<Vec<Utxo>, Error>> + Send;

    fn get_fee_rate(&self) -> impl Future<Output = Result<FeeRate, Error>> + Send;

    fn broadcast_transaction(
        &self,
        tx: &Transaction,
    ) -> impl Future<Output = Result<Txid, Error>> + Send;
}

impl UtxoSource for Client {
    async fn get_utxos(&self, address: &Address) -> Result<Vec<Utxo>, Error> {
        let unspent = self
            .list_unspent(0, MAX_CONFIRMATIONS, &[address.to_string()])
            .await?;
        Ok(unspent.into_iter().map(Utxo::from).collect())
    }

    async fn get_fee_rate(&self) -> Result<FeeRate, Error> {
        self.estimate_smart_fee(self.conf_target).await
    }

    async fn broadcast_transaction(&self, tx: &Transaction) -> Result<Txid, Error> {
        self.send_raw_transaction(tx).await
    }
}
