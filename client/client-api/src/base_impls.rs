mod rpc_client;
