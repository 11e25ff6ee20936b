pub mod mock_openai_server;
