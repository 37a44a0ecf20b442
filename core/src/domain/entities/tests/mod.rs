mod throttle_state_tests;
