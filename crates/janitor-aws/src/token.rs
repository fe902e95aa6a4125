//! EKS bearer tokens
//!
//! A token is a presigned STS `GetCallerIdentity` URL, bound to the cluster
//! through the signed `x-k8s-aws-id` header, base64url-encoded behind the
//! `k8s-aws-v1.` prefix. The API server's authenticator replays the URL to
//! learn the caller's identity.

use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{
    sign, SignableBody, SignableRequest, SignatureLocation, SigningParams, SigningSettings,
};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use janitor_core::{Error, Result};
use std::time::{Duration, SystemTime};

pub const TOKEN_PREFIX: &str = "k8s-aws-v1.";

/// Header binding the presigned request to a cluster
pub const CLUSTER_ID_HEADER: &str = "x-k8s-aws-id";

/// Presigned URL lifetime; the authenticator accepts at most 15 minutes
pub const PRESIGN_EXPIRY: Duration = Duration::from_secs(60);

fn sts_url(region: &str) -> String {
    format!(
        "https://sts.{}.amazonaws.com/?Action=GetCallerIdentity&Version=2011-06-15",
        region
    )
}

fn signing_error(e: impl std::fmt::Display) -> Error {
    Error::provider("sts:PresignGetCallerIdentity", e.to_string())
}

/// Resolve credentials from `provider` and build a token for `cluster_name`
pub async fn cluster_token(
    provider: &impl ProvideCredentials,
    region: &str,
    cluster_name: &str,
) -> Result<String> {
    let credentials = provider
        .provide_credentials()
        .await
        .map_err(|e| Error::provider("sts:ResolveCredentials", e))?;
    presign(&credentials, region, cluster_name, SystemTime::now())
}

/// Build a token from resolved credentials at a fixed signing time
pub fn presign(
    credentials: &Credentials,
    region: &str,
    cluster_name: &str,
    time: SystemTime,
) -> Result<String> {
    let identity: Identity = credentials.clone().into();
    let mut settings = SigningSettings::default();
    settings.signature_location = SignatureLocation::QueryParams;
    settings.expires_in = Some(PRESIGN_EXPIRY);

    let params: SigningParams<'_> = v4::SigningParams::builder()
        .identity(&identity)
        .region(region)
        .name("sts")
        .time(time)
        .settings(settings)
        .build()
        .map_err(signing_error)?
        .into();

    let url = sts_url(region);
    let signable = SignableRequest::new(
        "GET",
        url.as_str(),
        [(CLUSTER_ID_HEADER, cluster_name)].into_iter(),
        SignableBody::Bytes(&[]),
    )
    .map_err(signing_error)?;
    let (instructions, _signature) = sign(signable, &params).map_err(signing_error)?.into_parts();

    let mut request = http::Request::builder()
        .method("GET")
        .uri(url.as_str())
        .header(CLUSTER_ID_HEADER, cluster_name)
        .body(())
        .map_err(signing_error)?;
    instructions.apply_to_request_http1x(&mut request);

    Ok(format!(
        "{}{}",
        TOKEN_PREFIX,
        URL_SAFE_NO_PAD.encode(request.uri().to_string())
    ))
}
