use neoconnect_rpc::RpcRequest;

/// Decides whether a request is fulfilled without asking the user.
///
/// Receives the session address on the request's chain (if the session has one), the chain id
/// and the request. Returning `false` queues the request for manual approval.
pub trait AutoAcceptPolicy: Send + Sync {
    fn should_accept(&self, address: Option<&str>, chain_id: &str, request: &RpcRequest) -> bool;
}

impl<F> AutoAcceptPolicy for F
where
    F: Fn(Option<&str>, &str, &RpcRequest) -> bool + Send + Sync,
{
    fn should_accept(&self, address: Option<&str>, chain_id: &str, request: &RpcRequest) -> bool {
        self(address, chain_id, request)
    }
}

/// Accepts requests whose method is in the list.
#[derive(Clone, Debug, Default)]
pub struct MethodAllowList(pub Vec<String>);

impl AutoAcceptPolicy for MethodAllowList {
    fn should_accept(&self, _address: Option<&str>, _chain_id: &str, request: &RpcRequest) -> bool {
        self.0.iter().any(|method| *method == request.method)
    }
}
